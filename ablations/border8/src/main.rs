//! 肺边界修正消融实验: 对比不同分类器下的修正效果与耗时.
//!
//! 数据路径等配置见 `utils::loader`.

mod profile;
mod result;
mod runner;

use log::{error, LevelFilter};
use simple_logger::SimpleLogger;

fn main() {
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .env()
        .init()
        .expect("Logger initialization error");
    match runner::run() {
        Ok(result) => result.analyze(),
        Err(e) => {
            error!("Ablation aborted: {e}");
            std::process::exit(1);
        }
    }
}
