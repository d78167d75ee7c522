//! The `parlance models` command for managing local translation models.

use std::path::Path;

use clap::{Args, Subcommand};
use parlance_core::translate::{MarianLoader, MarianModel, SOURCE_LANG};
use parlance_core::types::primary_subtag;
use parlance_core::Config;

/// Arguments for the `models` command.
#[derive(Args, Debug)]
pub struct ModelsArgs {
    #[command(subcommand)]
    pub command: ModelsCommand,
}

/// Subcommands for model management.
#[derive(Subcommand, Debug)]
pub enum ModelsCommand {
    /// Download opus-mt models ahead of time (e.g. `models download fr de`)
    Download {
        /// Target languages
        #[arg(required = true)]
        langs: Vec<String>,
    },

    /// List installed models
    List,

    /// Show model directory path
    Path,
}

/// An installed model directory and whether every file is present.
#[derive(Debug, PartialEq, Eq)]
pub struct InstalledModel {
    pub language_key: String,
    pub complete: bool,
}

/// Scan `model_dir` for `opus-mt-en-<lang>` directories.
pub fn installed_models(model_dir: &Path) -> std::io::Result<Vec<InstalledModel>> {
    let prefix = format!("opus-mt-{SOURCE_LANG}-");
    let mut models = Vec::new();

    if !model_dir.exists() {
        return Ok(models);
    }

    for entry in std::fs::read_dir(model_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if let Some(language_key) = name.strip_prefix(&prefix) {
            models.push(InstalledModel {
                language_key: language_key.to_string(),
                complete: MarianModel::files_present(&entry.path()),
            });
        }
    }

    models.sort_by(|a, b| a.language_key.cmp(&b.language_key));
    Ok(models)
}

/// Execute the models command.
pub async fn execute(args: ModelsArgs, config: Config) -> anyhow::Result<()> {
    match args.command {
        ModelsCommand::Download { langs } => {
            let loader = MarianLoader::new(config.model_dir(), config.local.clone());
            let mut failed = 0usize;

            for lang in &langs {
                let key = primary_subtag(lang);
                match loader.ensure_downloaded(&key).await {
                    Ok(dir) => tracing::info!("{key}: ready at {:?}", dir),
                    Err(e) => {
                        tracing::error!("{key}: {e}");
                        failed += 1;
                    }
                }
            }

            if failed > 0 {
                anyhow::bail!("{failed} of {} model downloads failed", langs.len());
            }
            tracing::info!("All downloads complete.");
        }

        ModelsCommand::List => {
            let model_dir = config.model_dir();
            let models = installed_models(&model_dir)?;

            if models.is_empty() {
                println!("No models installed.");
                println!(
                    "Run `parlance models download <lang>`, or let the server fetch them on first use."
                );
                return Ok(());
            }

            println!("Installed models:");
            println!("  Directory: {}\n", model_dir.display());
            for model in models {
                let status = if model.complete { "ready" } else { "incomplete" };
                let name = format!("opus-mt-{SOURCE_LANG}-{}", model.language_key);
                println!("    - {:30} {}", name, status);
            }
        }

        ModelsCommand::Path => {
            println!("{}", config.model_dir().display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn installed_models_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let models = installed_models(&dir.path().join("nope")).unwrap();
        assert!(models.is_empty());
    }

    #[test]
    fn installed_models_reports_completeness() {
        let dir = tempfile::tempdir().unwrap();
        let fr = dir.path().join("opus-mt-en-fr");
        let de = dir.path().join("opus-mt-en-de");
        std::fs::create_dir_all(&fr).unwrap();
        std::fs::create_dir_all(&de).unwrap();
        std::fs::create_dir_all(dir.path().join("unrelated")).unwrap();
        for file in ["encoder_model.onnx", "decoder_model.onnx", "tokenizer.json", "config.json"] {
            std::fs::write(fr.join(file), b"x").unwrap();
        }
        assert!(MarianModel::files_present(&fr));

        let models = installed_models(dir.path()).unwrap();
        assert_eq!(
            models,
            vec![
                InstalledModel {
                    language_key: "de".into(),
                    complete: false
                },
                InstalledModel {
                    language_key: "fr".into(),
                    complete: true
                },
            ]
        );
    }
}
