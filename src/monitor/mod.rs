pub mod poll;
pub mod recording;
pub mod shutdown;

pub use poll::{resolve_pid, PollLoop, PollSettings, PollState, RunOutcome};
pub use recording::{Point, Recording, Series, PROCESS_SERIES};
pub use shutdown::Shutdown;
