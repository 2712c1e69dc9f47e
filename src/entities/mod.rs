pub mod employee;
pub mod tool;
pub mod tool_measure;
pub mod tool_transaction;
pub mod work_center;

pub use tool::ToolStatus;
pub use tool_measure::MeasureCondition;
pub use tool_transaction::TransactionStatus;
