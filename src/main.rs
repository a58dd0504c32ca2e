//! refpages binary entry point.

use refpages::ui::output;

fn main() {
    if let Err(err) = refpages::cli::run() {
        output::error(format!("{:#}", err));
        std::process::exit(1);
    }
}
