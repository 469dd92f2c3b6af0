use pathforge_ir::parse::ParseError;
use pathforge_search::engine::EngineError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}
