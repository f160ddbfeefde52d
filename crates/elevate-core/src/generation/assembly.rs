use std::sync::OnceLock;

const IMPORTS_HEADER: &str = "# Generated imports";
const ORIGINAL_HEADER: &str = "# Original code.";
const COMPLETION_HEADER: &str = "# Generated Completion";
const SEPARATOR: &str = "\n\n";

/// Comment line between sections: `# -` repeated forty times.
pub fn divider() -> &'static str {
    static DIVIDER: OnceLock<String> = OnceLock::new();
    DIVIDER.get_or_init(|| "# -".repeat(40))
}

/// Final program text: generated imports, then the caller's code, then the
/// generated completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledSource {
    pub imports: String,
    pub existing_code: String,
    pub completion: String,
}

impl AssembledSource {
    pub fn new(
        imports: impl Into<String>,
        existing_code: impl Into<String>,
        completion: impl Into<String>,
    ) -> Self {
        Self {
            imports: imports.into(),
            existing_code: existing_code.into(),
            completion: completion.into(),
        }
    }

    pub fn render(&self) -> String {
        [
            divider(),
            IMPORTS_HEADER,
            self.imports.as_str(),
            divider(),
            ORIGINAL_HEADER,
            self.existing_code.as_str(),
            divider(),
            COMPLETION_HEADER,
            self.completion.as_str(),
        ]
        .join(SEPARATOR)
    }

    /// Recover the sections of rendered source. `None` if the markers are missing.
    pub fn split(text: &str) -> Option<Self> {
        let opening = format!("{}{}{}{}", divider(), SEPARATOR, IMPORTS_HEADER, SEPARATOR);
        let original_marker = format!("{0}{1}{0}{2}{0}", SEPARATOR, divider(), ORIGINAL_HEADER);
        let completion_marker = format!("{0}{1}{0}{2}{0}", SEPARATOR, divider(), COMPLETION_HEADER);

        let rest = text.strip_prefix(&opening)?;
        let (imports, rest) = rest.split_once(&original_marker)?;
        let (existing_code, completion) = rest.split_once(&completion_marker)?;
        Some(Self::new(imports, existing_code, completion))
    }
}
