//! Speed changes while running, through a plain text file.
//!
//! The operator writes a number (`echo 0.4 > <file>`) to change the manual
//! speed, or `stop` to end the loop. The file is emptied once consumed.

use std::{
    fs,
    io,
    path::{Path, PathBuf},
};

use ms_core::utils::{CommandSource, GovernorResult, ManualCommand, NormalizedSpeed, StopToken};

pub struct SpeedFile<'a> {
    path: PathBuf,
    manual: ManualCommand,
    stop: StopToken<'a>,
}

impl<'a> SpeedFile<'a> {
    /// Create (or truncate) the control file.
    pub fn create(
        path: &Path,
        initial: NormalizedSpeed,
        stop: StopToken<'a>,
    ) -> io::Result<Self> {
        fs::write(path, "")?;
        Ok(Self {
            path: path.to_path_buf(),
            manual: ManualCommand::new(initial),
            stop,
        })
    }

    fn poll(&mut self) {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(_) => return,
        };
        let request = contents.trim();
        if request.is_empty() {
            return;
        }
        if let Err(error) = fs::write(&self.path, "") {
            tracing::warn!(%error, path = %self.path.display(), "failed to clear speed file");
        }

        if request.eq_ignore_ascii_case("stop") || request == "x" {
            tracing::info!("stop requested through speed file");
            self.stop.request_stop();
            return;
        }
        match request.parse::<f32>() {
            Ok(value) => {
                if let Err(error) = self.manual.set(value) {
                    tracing::error!(%error, "speed file request rejected");
                }
            }
            Err(_) => tracing::error!(request, "speed file does not hold a number"),
        }
    }
}

impl CommandSource for SpeedFile<'_> {
    fn read_command(&mut self) -> GovernorResult<NormalizedSpeed> {
        self.poll();
        self.manual.read_command()
    }
}

impl Drop for SpeedFile<'_> {
    fn drop(&mut self) {
        if let Err(error) = fs::remove_file(&self.path) {
            tracing::warn!(%error, path = %self.path.display(), "failed to remove speed file");
        }
    }
}
