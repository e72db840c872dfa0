pub mod ai_contract;
pub mod ai_service;
pub mod orchestrator_service;
pub mod recovery_service;
pub mod score_service;
pub mod session_service;
pub mod store_service;
pub mod submission_service;
pub mod timer_service;
