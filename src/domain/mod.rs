pub mod award;
pub mod match_fact;
pub mod player;
pub mod position;
pub mod window;

pub use award::*;
pub use match_fact::*;
pub use player::*;
pub use position::*;
pub use window::*;
