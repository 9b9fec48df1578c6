use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};

pub type LogFile = Arc<Mutex<BufWriter<File>>>;

#[derive(Clone)]
enum Sink {
    /// stdout + ログファイル
    File { file: LogFile, path: PathBuf },
    Console,
    /// テスト用: 行をメモリに溜める
    Capture(Arc<Mutex<Vec<String>>>),
    Disabled,
}

/// コンソールとログファイルに同じ行を書くロガー
#[derive(Clone)]
pub struct Logger {
    sink: Sink,
}

impl Logger {
    /// `<dir>/<prefix>_%Y%m%d_%H%M%S.log` を作成
    pub fn open<P: AsRef<Path>>(dir: P, prefix: &str) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create log dir {}", dir.display()))?;
        let ts = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let path = dir.join(format!("{}_{}.log", prefix, ts));
        let file = File::create(&path)
            .with_context(|| format!("failed to create log file {}", path.display()))?;
        eprintln!("Log: {}", path.display());
        Ok(Self {
            sink: Sink::File {
                file: Arc::new(Mutex::new(BufWriter::new(file))),
                path,
            },
        })
    }

    pub fn console() -> Self {
        Self { sink: Sink::Console }
    }

    pub fn disabled() -> Self {
        Self { sink: Sink::Disabled }
    }

    /// 書かれた行を後から読めるロガー
    pub fn capture() -> (Self, Arc<Mutex<Vec<String>>>) {
        let lines = Arc::new(Mutex::new(Vec::new()));
        (Self { sink: Sink::Capture(lines.clone()) }, lines)
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.sink {
            Sink::File { path, .. } => Some(path),
            _ => None,
        }
    }

    pub fn line(&self, msg: &str) {
        match &self.sink {
            Sink::File { file, .. } => {
                println!("{}", msg);
                if let Ok(mut f) = file.lock() {
                    let _ = writeln!(f, "{}", msg);
                }
            }
            Sink::Console => println!("{}", msg),
            Sink::Capture(lines) => {
                if let Ok(mut lines) = lines.lock() {
                    lines.push(msg.to_string());
                }
            }
            Sink::Disabled => {}
        }
    }

    pub fn flush(&self) {
        if let Sink::File { file, .. } = &self.sink {
            if let Ok(mut f) = file.lock() {
                let _ = f.flush();
            }
        }
    }
}

/// `log!(logger, "fmt", args..)`
#[macro_export]
macro_rules! log {
    ($logger:expr, $($arg:tt)*) => {{
        let msg = format!($($arg)*);
        $logger.line(&msg);
    }};
}
