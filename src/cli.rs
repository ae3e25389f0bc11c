//! CLI argument parsing with clap.

use std::path::PathBuf;

use clap::Parser;

/// Edit an image with a natural-language instruction using Gemini image models.
#[derive(Parser, Debug)]
#[command(name = "pixelperfect", version, about)]
pub struct Cli {
    /// Image to edit (PNG, JPEG, WebP, ...).
    pub image: PathBuf,

    /// Editing instruction, e.g. "remove the background".
    #[arg(conflicts_with = "prompt_file")]
    pub prompt: Option<String>,

    /// Path to a file containing the instruction.
    #[arg(short = 'p', long, conflicts_with = "prompt")]
    pub prompt_file: Option<PathBuf>,

    /// Model name or short alias (defaults to the config file, then nano-banana).
    #[arg(short, long)]
    pub model: Option<String>,

    /// Output file path (auto-generated if not specified).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Seconds to wait for the service before giving up.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Config file path override.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Resolve the prompt from either the positional argument or the file flag.
    ///
    /// # Errors
    ///
    /// Returns an error if neither is given, the file cannot be read,
    /// or the instruction is blank.
    pub fn resolve_prompt(&self) -> Result<String, std::io::Error> {
        let prompt = if let Some(ref text) = self.prompt {
            text.clone()
        } else if let Some(ref path) = self.prompt_file {
            std::fs::read_to_string(path)?
        } else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Provide an editing instruction or use -p/--prompt-file",
            ));
        };

        if prompt.trim().is_empty() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "The editing instruction is empty",
            ));
        }
        Ok(prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_and_prompt() {
        let cli = Cli::parse_from(["pixelperfect", "cat.png", "remove background"]);
        assert_eq!(cli.image, PathBuf::from("cat.png"));
        assert_eq!(cli.resolve_prompt().unwrap(), "remove background");
    }

    #[test]
    fn prompt_file_flag() {
        let dir = std::env::temp_dir().join("pixelperfect_cli_pf_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("prompt.txt");
        std::fs::write(&path, "make it a pencil sketch").unwrap();

        let cli = Cli::parse_from(["pixelperfect", "cat.png", "-p", path.to_str().unwrap()]);
        assert!(cli.prompt.is_none());
        assert_eq!(cli.resolve_prompt().unwrap(), "make it a pencil sketch");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn default_values() {
        let cli = Cli::parse_from(["pixelperfect", "cat.png", "x"]);
        assert!(cli.model.is_none());
        assert!(cli.output.is_none());
        assert!(cli.timeout.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn all_options() {
        let cli = Cli::parse_from([
            "pixelperfect",
            "-m",
            "nano-banana-pro",
            "-o",
            "out.png",
            "--timeout",
            "30",
            "--config",
            "cfg.toml",
            "-v",
            "cat.png",
            "add a hat",
        ]);
        assert_eq!(cli.model.as_deref(), Some("nano-banana-pro"));
        assert_eq!(cli.output, Some(PathBuf::from("out.png")));
        assert_eq!(cli.timeout, Some(30));
        assert_eq!(cli.config, Some(PathBuf::from("cfg.toml")));
        assert!(cli.verbose);
        assert_eq!(cli.prompt.as_deref(), Some("add a hat"));
    }

    #[test]
    fn zero_timeout_rejected() {
        assert!(Cli::try_parse_from(["pixelperfect", "--timeout", "0", "cat.png", "x"]).is_err());
    }

    #[test]
    fn missing_or_blank_prompt_errors() {
        let cli = Cli::parse_from(["pixelperfect", "cat.png"]);
        assert!(cli.resolve_prompt().is_err());

        let cli = Cli::parse_from(["pixelperfect", "cat.png", "   "]);
        assert!(cli.resolve_prompt().is_err());
    }
}
