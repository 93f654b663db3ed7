//! Example session: open a few pages in Chrome driven through Selenium, walk
//! the history back and forth, and optionally export the cookie jar.

use automated_browser::browser::python::PythonLauncher;
use automated_browser::{AutomatedBrowser, BrowserConfig, BrowserKind, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "automated-browser")]
#[command(about = "Drive Chrome through Selenium from Rust")]
#[command(version)]
struct Cli {
    /// TOML file with browser settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run without a visible window
    #[arg(long)]
    headless: bool,

    /// Use undetected-chromedriver instead of stock Selenium
    #[arg(long)]
    undetected: bool,

    /// Path to the Chrome executable
    #[arg(long)]
    chrome_binary: Option<PathBuf>,

    /// Extra Chrome command-line option (repeatable)
    #[arg(long = "option")]
    options: Vec<String>,

    /// Milliseconds to wait after each navigation
    #[arg(long, default_value_t = 2000)]
    pause_ms: u64,

    /// Cookie jar to load before visiting pages
    #[arg(long)]
    load_cookies: Option<PathBuf>,

    /// Where to write the cookie jar before quitting
    #[arg(long)]
    save_cookies: Option<PathBuf>,

    /// Pages to visit, in order
    #[arg(default_values_t = [
        "https://github.com/inket".to_string(),
        "https://www.google.com".to_string(),
    ])]
    urls: Vec<String>,
}

impl Cli {
    fn browser_config(&self) -> Result<BrowserConfig> {
        let mut config = match &self.config {
            Some(path) => BrowserConfig::from_path(path)?,
            None => BrowserConfig::chrome(),
        };
        if self.undetected {
            config.browser = BrowserKind::UndetectedChrome;
        }
        if self.headless {
            config.headless = true;
        }
        if let Some(path) = &self.chrome_binary {
            config = config.with_binary_path(path);
        }
        for option in &self.options {
            config = config.with_option(option.as_str());
        }
        Ok(config)
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = cli.browser_config()?;
    let pause = Duration::from_millis(cli.pause_ms);

    let browser = AutomatedBrowser::launch_shared(config, PythonLauncher)?;

    if let Some(path) = &cli.load_cookies {
        browser.load_cookies(path)?;
    }

    for url in &cli.urls {
        browser.load(url.as_str())?;
        thread::sleep(pause);
        println!(
            "Current URL: {}",
            browser.current_url()?.unwrap_or_default()
        );
        let source = browser.page_source()?.unwrap_or_default();
        println!("Source: {}...", source.chars().take(60).collect::<String>());
    }

    if cli.urls.len() > 1 {
        browser.back()?;
        thread::sleep(pause);
        browser.forward()?;
        thread::sleep(pause);
    }

    if let Some(path) = &cli.save_cookies {
        browser.save_cookies(path)?;
    }

    browser.quit()
}

fn main() -> ExitCode {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "browser session failed");
            ExitCode::FAILURE
        }
    }
}
