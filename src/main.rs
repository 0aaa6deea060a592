//! Command line access to Glyphs sources through Bezy's variable glyph model.

use bezy_glyphs::core;

fn main() {
    core::platform::init_panic_handling();
    let cli_args = core::platform::get_cli_args();
    if let Err(error) = core::runner::run_app(cli_args) {
        core::platform::handle_error(error);
    }
}
