pub mod fault;
pub mod payload;
pub mod runner;
pub mod ticker;

pub use fault::RngDraws;
pub use payload::PayloadFormat;
pub use runner::connect_and_run;
pub use ticker::TokioTicker;
