use crate::ui::tui;

/// Restores the terminal and records the panic before the default hook
/// prints it, otherwise the message is lost in the alternate screen.
pub fn set_panic_hook() {
    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = tui::Tui::restore();
        tracing::error!(%panic_info, "panic");
        hook(panic_info);
    }));
}
