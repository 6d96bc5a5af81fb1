//! Console rendering of run progress.

use colored::Colorize;
use vdtest_core::report::Report;
use vdtest_core::runner::ProgressSink;

/// Prints progress to stdout in the build log style: blue section headers,
/// green completion lines, plain status lines.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl ProgressSink for ConsoleSink {
    fn section(&mut self, title: &str) {
        println!();
        println!("{}", title.blue());
    }

    fn done(&mut self, message: &str) {
        println!("{}", format!("=> {}", message).green());
    }

    fn status(&mut self, line: &str) {
        println!("{}", line);
    }

    fn report(&mut self, report: &Report) {
        println!();
        println!("{}", "Test results:".blue());
        println!("{}", report.render());
    }
}
