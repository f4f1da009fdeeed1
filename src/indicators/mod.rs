// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free indicator implementations. Every public function
// returns `Result` so callers must handle empty input explicitly.

pub mod ema;

pub use ema::{EmaError, EmaSet, EMA_PERIODS};
