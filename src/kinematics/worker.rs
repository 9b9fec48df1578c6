use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use super::angles::JointAngleData;
use crate::motion::Motion;
use crate::skeleton::JOINTS;

/// バックグラウンドで計算した角度テーブル
#[derive(Debug)]
pub struct AngleJobResult {
    /// 計算対象モーションの世代番号
    pub generation: u64,
    pub data: JointAngleData,
    pub elapsed: Duration,
}

/// 角度テーブルの一括計算スレッド
///
/// 結果はテーブルを埋め終えてから1回だけ送信されるので、受け取る側は
/// 完成品しか観測しない。
pub struct AngleWorker {
    generation: u64,
    rx: mpsc::Receiver<AngleJobResult>,
}

impl AngleWorker {
    pub fn spawn(motion: Arc<Motion>, generation: u64) -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let started = Instant::now();
            let data = JointAngleData::compute(&motion, &JOINTS);
            // 受信側が先に破棄されていれば結果は捨てる
            let _ = tx.send(AngleJobResult {
                generation,
                data,
                elapsed: started.elapsed(),
            });
        });
        Self { generation, rx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// 完了していれば結果を返す（ブロックしない）
    pub fn try_take(&self) -> Option<AngleJobResult> {
        self.rx.try_recv().ok()
    }

    /// 完了まで待つ
    pub fn wait(self) -> Option<AngleJobResult> {
        self.rx.recv().ok()
    }
}
