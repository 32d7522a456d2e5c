pub mod infer;
pub mod inspect;
pub mod tape;
pub mod train;
