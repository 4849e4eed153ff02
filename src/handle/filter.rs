// 表/字段的 include、exclude 过滤

use crate::error::{Result, WorkerError};
use crate::util::pattern::{compile_all, matches_any};

fn keeps_all(include: &[String]) -> bool {
    include.len() == 1 && include[0] == "*"
}

// 按 available 的顺序返回，重复名称只保留一次
pub fn select_names(
    available: &[String],
    include: &[String],
    exclude: Option<&[String]>,
) -> Result<Vec<String>> {
    let mut selected: Vec<String> = Vec::with_capacity(available.len());
    if keeps_all(include) {
        for name in available {
            if !selected.contains(name) {
                selected.push(name.clone());
            }
        }
    } else {
        let include = compile_all(include)?;
        for name in available {
            if matches_any(&include, name) && !selected.contains(name) {
                selected.push(name.clone());
            }
        }
    }

    if let Some(exclude) = exclude {
        let exclude = compile_all(exclude)?;
        selected.retain(|name| !matches_any(&exclude, name));
    }
    Ok(selected)
}

/// 同 [`select_names`]，但结果为空时返回 `WorkerError::NoColumns`
pub fn select_columns(
    table: &str,
    available: &[String],
    include: &[String],
    exclude: Option<&[String]>,
) -> Result<Vec<String>> {
    let columns = select_names(available, include, exclude)?;
    if columns.is_empty() {
        return Err(WorkerError::NoColumns(format!(
            "table {} has no columns left after include/exclude",
            table
        )));
    }
    Ok(columns)
}

#[cfg(test)]
mod test_filter {
    use std::collections::HashSet;

    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_include_star_keeps_all() {
        let available = names(&["T1", "T2", "roads"]);
        let selected = select_names(&available, &names(&["*"]), None).unwrap();
        assert_eq!(selected, available);
    }

    #[test]
    fn test_include_and_exclude() {
        let available = names(&["T1", "T2", "T3"]);
        let selected =
            select_names(&available, &names(&["T*"]), Some(names(&["T3"]).as_slice())).unwrap();
        let selected: HashSet<String> = selected.into_iter().collect();
        let expected: HashSet<String> = names(&["T1", "T2"]).into_iter().collect();
        assert_eq!(selected, expected);
    }

    #[test]
    fn test_overlapping_includes_do_not_duplicate() {
        let available = names(&["name", "name_old", "area"]);
        let selected =
            select_names(&available, &names(&["name*", "NAME"]), None).unwrap();
        assert_eq!(selected, names(&["name", "name_old"]));
    }

    #[test]
    fn test_exclude_with_keep_all() {
        let available = names(&["id", "SHAPE", "name"]);
        let selected =
            select_names(&available, &names(&["*"]), Some(names(&["shape"]).as_slice())).unwrap();
        assert_eq!(selected, names(&["id", "name"]));
    }

    #[test]
    fn test_empty_columns_is_no_columns_error() {
        let available = names(&["id", "name"]);
        let result = select_columns("parcels", &available, &names(&["zzz*"]), None);
        assert!(matches!(result, Err(WorkerError::NoColumns(_))));
    }
}
