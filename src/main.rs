use anyhow::Result;
use console::{Term, style};
use log::{info, warn};
use video_factory::config::Config;
use video_factory::init;
use video_factory::menu::show_main_menu;
use video_factory::signal::setup_shutdown_signal;

fn main() -> Result<()> {
    init::init();
    let term = Term::stdout();
    let shutdown_signal = setup_shutdown_signal();

    // 載入設定並套用介面語言
    let mut config = Config::new()?;
    rust_i18n::set_locale(config.settings.language.locale_code());

    loop {
        match show_main_menu(&term, &shutdown_signal, &mut config) {
            Ok(true) => {}
            Ok(false) => {
                term.clear_screen()?;
                println!("\n{}", style("再見！").green().bold());
                info!("Program exited normally");
                break;
            }
            Err(e) => {
                warn!("Program error: {e}");
                eprintln!("{} {}", style("錯誤:").red().bold(), e);
                break;
            }
        }
    }

    Ok(())
}
