use crate::component::BatchConverter;
use crate::config::Config;
use crate::pause;
use anyhow::Result;
use console::{Term, style};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub fn run_batch_converter(
    term: &Term,
    shutdown_signal: &Arc<AtomicBool>,
    config: &Config,
) -> Result<()> {
    // 上一輪留下的中斷旗標要先清掉，否則新批次會立刻中止
    shutdown_signal.store(false, Ordering::SeqCst);

    let converter = BatchConverter::new(config.clone(), Arc::clone(shutdown_signal));

    if let Err(e) = converter.run() {
        eprintln!("{} {}", style("錯誤:").red().bold(), e);
    }

    pause(term)?;
    Ok(())
}
