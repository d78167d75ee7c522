//! The `parlance translate` command: one-off translation from the terminal.

use clap::Args;
use parlance_core::{Config, FallbackTranslator, TranslationRequest};

/// Arguments for the `translate` command.
#[derive(Args, Debug)]
pub struct TranslateArgs {
    /// English text to translate
    pub text: String,

    /// Target language or locale (e.g. `fr`, `de-DE`)
    #[arg(short, long)]
    pub to: String,
}

/// Execute the translate command.
///
/// Prints `provider: text` on stdout.
pub async fn execute(args: TranslateArgs, config: Config) -> anyhow::Result<()> {
    let request = TranslationRequest::new(Some(&args.text), Some(&args.to))?;
    let translator = FallbackTranslator::from_config(&config);

    let result = translator.translate(&request).await?;
    println!("{}: {}", result.provider, result.translated_text);
    Ok(())
}
