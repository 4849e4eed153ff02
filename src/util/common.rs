use std::{fs, path::Path};

use serde::Deserialize;
use tracing::info;

use crate::error::Result;

// 载入任务配置
// .toml 文件按 toml 解析，其余按 json 解析
pub fn load_job_config<T, P>(job_path: P) -> Result<T>
where
    for<'de> T: Deserialize<'de>,
    P: AsRef<Path>,
{
    let job_path = job_path.as_ref();
    info!(path = %job_path.display(), "loading job config");
    let job_str = fs::read_to_string(job_path)?;
    let is_toml = job_path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let job: T = if is_toml {
        toml::from_str(&job_str)?
    } else {
        serde_json::from_str(&job_str)?
    };
    Ok(job)
}
