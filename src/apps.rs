use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};

/// One entry on the quick-launch screen. `exec` is either a URL or a
/// command line; command lines are shell-tokenized before spawning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickApp {
    pub label: String,
    pub exec: String,
}

fn is_url(exec: &str) -> bool {
    exec.starts_with("http://") || exec.starts_with("https://")
}

pub(crate) fn exec_tokens(exec: &str) -> Vec<String> {
    shlex::split(exec)
        .unwrap_or_else(|| exec.split_whitespace().map(str::to_string).collect())
}

pub fn launch(app: &QuickApp) -> anyhow::Result<()> {
    let exec = app.exec.trim();
    if exec.is_empty() {
        return Err(anyhow!("quick app '{}' has an empty exec", app.label));
    }
    if is_url(exec) {
        return open::that(exec).with_context(|| format!("failed to open {exec}"));
    }
    let tokens = exec_tokens(exec);
    let (program, args) = tokens
        .split_first()
        .ok_or_else(|| anyhow!("quick app '{}' has an empty exec", app.label))?;
    std::process::Command::new(program)
        .args(args)
        .spawn()
        .with_context(|| format!("failed to spawn {program}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_detection() {
        assert!(is_url("https://example.com/kiosk"));
        assert!(!is_url("firefox --kiosk https://example.com"));
    }

    #[test]
    fn exec_tokens_respect_quoting() {
        let tokens = exec_tokens("mpv --fs \"/media/intro video.mp4\"");
        assert_eq!(tokens, vec!["mpv", "--fs", "/media/intro video.mp4"]);
    }

    #[test]
    fn empty_exec_is_rejected() {
        let app = QuickApp {
            label: "broken".into(),
            exec: "   ".into(),
        };
        assert!(launch(&app).is_err());
    }
}
