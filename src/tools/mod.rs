//! 动作层：注册表、执行器与内置动作（search、calculate、echo）

pub mod calculate;
pub mod echo;
pub mod executor;
pub mod registry;
pub mod search;

pub use calculate::CalculateTool;
pub use echo::EchoTool;
pub use executor::ActionExecutor;
pub use registry::{Action, ActionRegistry, FnAction};
pub use search::SearchTool;
