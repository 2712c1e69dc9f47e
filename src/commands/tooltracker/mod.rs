pub mod check_out_tool_command;
pub mod return_tool_command;

pub use check_out_tool_command::{CheckOutToolCommand, CheckoutResult};
pub use return_tool_command::{ReturnResult, ReturnToolCommand};
