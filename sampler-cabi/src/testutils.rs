use std::env;
use std::process::Command;

use sampler_config::{
    GLOBAL_FENCES, PROFILE_LIBRARY, RANDOM_SEED, SAMPLER_LOG_FORMAT, SAMPLER_PROB, SAMPLER_SKIP,
    SAMPLER_VERBOSE, TOOLS_LIBS,
};

/// Set in the environment of a test binary started by [`rerun`].
const CHILD_VAR: &str = "KP_SAMPLER_TEST_CHILD";

/// The output of a test re-run in a child process.
#[derive(Debug)]
pub struct ChildOutput {
    /// The exit status of the child.
    pub status: Option<i32>,
    /// All fatal diagnostic lines, from stdout and stderr.
    pub diagnostics: Vec<String>,
    /// All warning lines, from stdout and stderr.
    pub warnings: Vec<String>,
}

/// Returns `true` in a test binary started by [`rerun`].
pub fn is_child() -> bool {
    env::var_os(CHILD_VAR).is_some()
}

/// Runs a single test of this binary in a child process with the given sampler variables.
///
/// All other sampler variables are removed from the child's environment.
pub fn rerun(test: &str, vars: &[(&str, &str)]) -> ChildOutput {
    let mut command = Command::new(env::current_exe().unwrap());
    command
        .args([test, "--exact", "--nocapture", "--test-threads=1"])
        .env(CHILD_VAR, "1")
        .env_remove("RUST_LOG");

    for key in [
        TOOLS_LIBS,
        PROFILE_LIBRARY,
        SAMPLER_VERBOSE,
        GLOBAL_FENCES,
        SAMPLER_SKIP,
        SAMPLER_PROB,
        RANDOM_SEED,
        SAMPLER_LOG_FORMAT,
    ] {
        command.env_remove(key);
    }
    command.envs(vars.iter().copied());

    let output = command.output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    // The test runner may print the test name on the same line as the first output.
    let lines_with = |marker: &str| -> Vec<String> {
        stdout
            .lines()
            .chain(stderr.lines())
            .filter_map(|line| line.find(marker).map(|start| line[start..].to_owned()))
            .collect()
    };

    ChildOutput {
        status: output.status.code(),
        diagnostics: lines_with("KokkosP: FATAL: "),
        warnings: lines_with("KokkosP: warning: "),
    }
}
