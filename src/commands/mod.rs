pub type CmdResult<T> = relink::Result<(T, i32)>;

pub(crate) struct GlobalArgs {}

pub mod init;
pub mod link;
pub mod replace;
pub mod templates;
pub mod update;

/// Dispatch a command to its handler and map result to JSON.
macro_rules! dispatch {
    ($args:expr, $global:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args, $global))
    };
}

pub(crate) fn run_json(
    command: crate::Commands,
    global: &GlobalArgs,
) -> (relink::Result<serde_json::Value>, i32) {
    match command {
        crate::Commands::Init(args) => dispatch!(args, global, init),
        crate::Commands::Link(args) => dispatch!(args, global, link),
        crate::Commands::Update(args) => dispatch!(args, global, update),
        crate::Commands::Replace(args) => dispatch!(args, global, replace),
        crate::Commands::Templates(args) => dispatch!(args, global, templates),
    }
}
