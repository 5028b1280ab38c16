use crate::config::save::save_settings;
use crate::config::types::{Config, Language};
use crate::menu::handlers::run_batch_converter;
use crate::tools::{EncoderProfile, SplitMode};
use anyhow::Result;
use console::{Term, style};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};
use rust_i18n::t;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

pub fn show_main_menu(
    term: &Term,
    shutdown_signal: &Arc<AtomicBool>,
    config: &mut Config,
) -> Result<bool> {
    term.clear_screen()?;

    println!("{}", style(t!("main_menu.title")).cyan().bold());
    println!("{}", style(t!("common.esc_hint")).dim());

    let options = vec![
        t!("main_menu.opt_convert"),
        t!("main_menu.opt_settings"),
        t!("main_menu.exit"),
    ];

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(t!("main_menu.prompt").to_string())
        .items(&options)
        .default(0)
        .interact_on_opt(term)?;

    match selection {
        Some(0) => {
            run_batch_converter(term, shutdown_signal, config)?;
            Ok(true)
        }
        Some(1) => {
            show_settings_menu(term, config)?;
            Ok(true)
        }
        Some(2) | None => Ok(false), // ESC pressed - exit
        _ => unreachable!(),
    }
}

/// 設定選單
fn show_settings_menu(term: &Term, config: &mut Config) -> Result<()> {
    loop {
        term.clear_screen()?;

        println!("{}", style(t!("settings.title")).cyan().bold());
        println!("{}", style(t!("common.esc_hint")).dim());

        let options = vec![
            t!("settings.opt_basic"),
            t!("settings.opt_encoder"),
            t!("settings.opt_split"),
            t!("settings.opt_language"),
            t!("settings.back"),
        ];

        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt(t!("settings.prompt").to_string())
            .items(&options)
            .default(0)
            .interact_on_opt(term)?;

        match selection {
            Some(0) => show_basic_settings_menu(term, config)?,
            Some(1) => show_encoder_settings_menu(term, config)?,
            Some(2) => show_split_settings_menu(term, config)?,
            Some(3) => show_language_menu(term, config)?,
            Some(4) | None => break, // ESC or back
            _ => unreachable!(),
        }
    }

    Ok(())
}

/// 基本設定：碼率、並發數、輸出目錄
fn show_basic_settings_menu(term: &Term, config: &mut Config) -> Result<()> {
    term.clear_screen()?;
    println!("{}", style(t!("settings.basic.title")).cyan().bold());

    let settings = &mut config.settings;
    settings.bitrate = prompt_with_default(&t!("settings.basic.bitrate"), &settings.bitrate)?;
    settings.concurrency =
        prompt_with_default(&t!("settings.basic.concurrency"), &settings.concurrency)?;
    settings.output_dir =
        prompt_with_default(&t!("settings.basic.output_dir"), &settings.output_dir)?;

    save_and_confirm(settings)
}

/// 編碼設定：硬體加速方案與裝置編號
fn show_encoder_settings_menu(term: &Term, config: &mut Config) -> Result<()> {
    term.clear_screen()?;
    println!("{}", style(t!("settings.encoder.title")).cyan().bold());

    let profiles = EncoderProfile::platform_options();
    let items: Vec<String> = profiles.iter().map(ToString::to_string).collect();
    let default_index = profiles
        .iter()
        .position(|&p| p == config.settings.encoder_profile)
        .unwrap_or(0);

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(t!("settings.encoder.profile_prompt").to_string())
        .items(&items)
        .default(default_index)
        .interact_on_opt(term)?;

    let Some(selection) = selection else {
        return Ok(());
    };
    config.settings.encoder_profile = profiles[selection];

    config.settings.device_index = prompt_with_default(
        &t!("settings.encoder.device_index"),
        &config.settings.device_index,
    )?;

    save_and_confirm(&config.settings)
}

/// 分割策略：模式、首段目標、最小分段
fn show_split_settings_menu(term: &Term, config: &mut Config) -> Result<()> {
    term.clear_screen()?;
    println!("{}", style(t!("settings.split.title")).cyan().bold());

    let modes = [SplitMode::Fixed, SplitMode::Auto];
    let items = vec![t!("settings.split.mode_fixed"), t!("settings.split.mode_auto")];
    let default_index = modes
        .iter()
        .position(|&m| m == config.settings.split_mode)
        .unwrap_or(0);

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(t!("settings.split.mode_prompt").to_string())
        .items(&items)
        .default(default_index)
        .interact_on_opt(term)?;

    let Some(selection) = selection else {
        return Ok(());
    };
    config.settings.split_mode = modes[selection];

    config.settings.first_segment_target = prompt_with_default(
        &t!("settings.split.first_target"),
        &config.settings.first_segment_target,
    )?;
    config.settings.min_segment_secs = prompt_with_default(
        &t!("settings.split.min_segment"),
        &config.settings.min_segment_secs,
    )?;

    save_and_confirm(&config.settings)
}

/// 語言設定
fn show_language_menu(term: &Term, config: &mut Config) -> Result<()> {
    term.clear_screen()?;

    let languages = [Language::ZhTw, Language::EnUs];
    let items: Vec<String> = languages.iter().map(ToString::to_string).collect();
    let default_index = languages
        .iter()
        .position(|&l| l == config.settings.language)
        .unwrap_or(0);

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(t!("settings.language.prompt").to_string())
        .items(&items)
        .default(default_index)
        .interact_on_opt(term)?;

    let Some(selection) = selection else {
        return Ok(());
    };

    if languages[selection] != config.settings.language {
        config.settings.language = languages[selection];
        rust_i18n::set_locale(config.settings.language.locale_code());
        save_settings(&config.settings)?;
    }

    Ok(())
}

fn prompt_with_default(prompt: &str, current: &str) -> Result<String> {
    let mut input = Input::new().with_prompt(prompt.to_string());
    if !current.is_empty() {
        input = input.default(current.to_string());
    }
    let value: String = input.interact_text()?;
    Ok(value.trim().to_string())
}

fn save_and_confirm(settings: &crate::config::UserSettings) -> Result<()> {
    save_settings(settings)?;
    println!("\n{}", style(t!("settings.saved")).green());
    std::thread::sleep(std::time::Duration::from_secs(1));
    Ok(())
}
