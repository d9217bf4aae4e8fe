pub mod check;
pub mod config;
pub mod list;

/// How a successful command ended, mapped to the process exit code CI sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Clean,
    StaleFound,
}

impl Outcome {
    pub const EXIT_ERROR: i32 = 2;

    pub fn exit_code(self) -> i32 {
        match self {
            Outcome::Clean => 0,
            Outcome::StaleFound => 1,
        }
    }
}
