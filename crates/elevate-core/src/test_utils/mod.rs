pub mod fake_sandbox;
pub mod mock_llm_server;
pub mod recording_llm;
