//! External player registry
//!
//! Describes the command-line wav players the external handler knows how to
//! drive. Templates use `{out}` for the wav path and `{speed}` for the
//! scaled speed value.

use std::path::Path;

/// Placeholder for the wav file in a play template
pub const OUT_FILE: &str = "{out}";
/// Placeholder for the scaled speed in a speed template
pub const SPEED: &str = "{speed}";

/// How to probe, launch, and control one external player
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommandDescriptor {
    pub id: &'static str,
    pub name: &'static str,
    /// Command launched to check that the player exists
    pub available: &'static [&'static str],
    pub play: &'static [&'static str],
    /// Appended to `play` when a non-zero speed is requested
    pub speed: Option<&'static [&'static str]>,
    pub speed_multiplier: f64,
    /// Force-kill on stop instead of asking the process to terminate
    pub kill: bool,
}

impl CommandDescriptor {
    /// Whether this player supports speed adjustment
    pub fn is_advanced(&self) -> bool {
        self.speed.is_some()
    }

    /// Speed value as passed on the command line
    pub fn speed_arg(&self, speed: i32) -> String {
        format_number(f64::from(speed) * self.speed_multiplier)
    }

    /// Build the argv used to play `out_file` at `speed` (0 = unchanged)
    pub fn play_args(&self, out_file: &Path, speed: i32) -> Vec<String> {
        let out = out_file.to_string_lossy();
        let mut args: Vec<String> = self
            .play
            .iter()
            .map(|arg| substitute(arg, OUT_FILE, &out))
            .collect();

        if speed != 0 {
            if let Some(template) = self.speed {
                let value = self.speed_arg(speed);
                args.extend(template.iter().map(|arg| substitute(arg, SPEED, &value)));
            }
        }
        args
    }
}

fn substitute(arg: &str, placeholder: &str, value: &str) -> String {
    if arg == placeholder {
        value.to_string()
    } else {
        arg.to_string()
    }
}

/// Shortest decimal form: 50.0 -> "50", 0.5 -> "0.5"
fn format_number(value: f64) -> String {
    let rounded = (value * 1_000_000.0).round() / 1_000_000.0;
    format!("{}", rounded)
}

pub const APLAY: CommandDescriptor = CommandDescriptor {
    id: "aplay",
    name: "aplay",
    available: &["aplay", "--version"],
    play: &["aplay", "-q", OUT_FILE],
    speed: None,
    speed_multiplier: 1.0,
    kill: false,
};

pub const PAPLAY: CommandDescriptor = CommandDescriptor {
    id: "paplay",
    name: "paplay",
    available: &["paplay", "--version"],
    play: &["paplay", OUT_FILE],
    speed: None,
    speed_multiplier: 1.0,
    kill: false,
};

pub const SOX: CommandDescriptor = CommandDescriptor {
    id: "sox",
    name: "SOX",
    available: &["sox", "--version"],
    play: &["play", "-q", OUT_FILE],
    speed: Some(&["tempo", "-s", SPEED]),
    speed_multiplier: 0.01,
    kill: true,
};

pub const MPLAYER: CommandDescriptor = CommandDescriptor {
    id: "mplayer",
    name: "MPlayer",
    available: &["mplayer", "--help"],
    play: &["mplayer", "-really-quiet", OUT_FILE],
    speed: Some(&["-af", "scaletempo", "-speed", SPEED]),
    speed_multiplier: 0.01,
    kill: false,
};

/// Players known on Unix-like hosts, in preference order
pub static UNIX_PLAYERS: &[CommandDescriptor] = &[APLAY, PAPLAY, SOX, MPLAYER];

/// Player registry for the current platform
pub fn registry() -> &'static [CommandDescriptor] {
    if cfg!(unix) {
        UNIX_PLAYERS
    } else {
        &[]
    }
}

/// Look up a registered player by id
pub fn find(id: &str) -> Option<&'static CommandDescriptor> {
    registry().iter().find(|p| p.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_speed_never_adds_speed_args() {
        for player in UNIX_PLAYERS {
            let args = player.play_args(Path::new("out.wav"), 0);
            assert_eq!(args.len(), player.play.len(), "{}", player.id);
            assert!(args.contains(&"out.wav".to_string()));
        }
    }

    #[test]
    fn test_speed_is_scaled_and_appended() {
        let args = SOX.play_args(Path::new("out.wav"), 50);
        assert_eq!(args, vec!["play", "-q", "out.wav", "tempo", "-s", "0.5"]);

        let args = MPLAYER.play_args(Path::new("out.wav"), 150);
        assert_eq!(
            args,
            vec![
                "mplayer",
                "-really-quiet",
                "out.wav",
                "-af",
                "scaletempo",
                "-speed",
                "1.5"
            ]
        );
    }

    #[test]
    fn test_speed_ignored_without_support() {
        let args = APLAY.play_args(Path::new("/tmp/a b.wav"), 50);
        assert_eq!(args, vec!["aplay", "-q", "/tmp/a b.wav"]);
    }

    #[test]
    fn test_speed_arg_formatting() {
        let unscaled = CommandDescriptor {
            speed: Some(&["--rate", SPEED]),
            ..APLAY
        };
        assert_eq!(unscaled.speed_arg(50), "50");
        assert_eq!(SOX.speed_arg(7), "0.07");
        assert_eq!(SOX.speed_arg(-20), "-0.2");
    }

    #[test]
    fn test_advanced_flags() {
        assert!(!APLAY.is_advanced());
        assert!(!PAPLAY.is_advanced());
        assert!(SOX.is_advanced());
        assert!(MPLAYER.is_advanced());
        assert!(SOX.kill && !MPLAYER.kill);
    }

    #[cfg(unix)]
    #[test]
    fn test_registry_order_and_lookup() {
        let ids: Vec<_> = registry().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["aplay", "paplay", "sox", "mplayer"]);
        assert_eq!(find("sox").map(|p| p.name), Some("SOX"));
        assert!(find("vlc").is_none());
    }
}
