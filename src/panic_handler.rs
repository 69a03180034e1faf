use std::panic;

use log::error;

/// Install the process panic hook.
///
/// Debug builds get `better_panic` backtraces; release builds get the
/// `human_panic` crash report. Either way the panic goes to the log first.
pub fn initialize_panic_handler() {
    #[cfg(debug_assertions)]
    better_panic::install();

    #[cfg(not(debug_assertions))]
    human_panic::setup_panic!();

    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        error!("{panic_info}");
        log::logger().flush();

        default_hook(panic_info);

        std::process::exit(1);
    }));
}
