// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// 规范化文本
///
/// 转小写后做 Unicode 规范分解（NFD），再去掉组合附加符号，
/// 使 “Contraseña”、“contrasena” 等写法得到相同结果
///
/// # 参数
///
/// * `text` - 待规范化的文本
///
/// # 返回值
///
/// 小写且无变音符号的文本；对结果再次调用结果不变
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// 规范化一组关键字
pub fn normalize_all<I, S>(keywords: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    keywords
        .into_iter()
        .map(|k| normalize(k.as_ref()))
        .collect()
}
