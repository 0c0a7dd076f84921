use serde::Serialize;

use crate::error::ValidationError;

/// A Steam localization language: the identifier used in file names and the
/// `"Language"` field, plus names for display and prompts.
#[derive(Debug, Serialize, PartialEq, Eq, Hash)]
pub struct SteamLanguage {
    pub id: &'static str,
    pub name: &'static str,
    pub chinese_name: &'static str,
}

const fn lang(
    id: &'static str,
    name: &'static str,
    chinese_name: &'static str,
) -> SteamLanguage {
    SteamLanguage {
        id,
        name,
        chinese_name,
    }
}

pub static LANGUAGES: [SteamLanguage; 30] = [
    lang("arabic", "Arabic", "阿拉伯语"),
    lang("bulgarian", "Bulgarian", "保加利亚语"),
    lang("schinese", "Simplified Chinese", "简体中文"),
    lang("tchinese", "Traditional Chinese", "繁体中文"),
    lang("czech", "Czech", "捷克语"),
    lang("danish", "Danish", "丹麦语"),
    lang("dutch", "Dutch", "荷兰语"),
    lang("english", "English", "英语"),
    lang("finnish", "Finnish", "芬兰语"),
    lang("french", "French", "法语"),
    lang("german", "German", "德语"),
    lang("greek", "Greek", "希腊语"),
    lang("hungarian", "Hungarian", "匈牙利语"),
    lang("italian", "Italian", "意大利语"),
    lang("japanese", "Japanese", "日语"),
    lang("koreana", "Korean", "韩语"),
    lang("norwegian", "Norwegian", "挪威语"),
    lang("polish", "Polish", "波兰语"),
    lang("portuguese", "Portuguese", "葡萄牙语"),
    lang("brazilian", "Portuguese (Brazil)", "巴西葡萄牙语"),
    lang("romanian", "Romanian", "罗马尼亚语"),
    lang("russian", "Russian", "俄语"),
    lang("spanish", "Spanish (Spain)", "西班牙语"),
    lang("latam", "Spanish (Latin America)", "拉丁美洲西班牙语"),
    lang("swedish", "Swedish", "瑞典语"),
    lang("thai", "Thai", "泰语"),
    lang("turkish", "Turkish", "土耳其语"),
    lang("ukrainian", "Ukrainian", "乌克兰语"),
    lang("vietnamese", "Vietnamese", "越南语"),
    lang("indonesian", "Indonesian", "印度尼西亚语"),
];

pub fn lookup(id: &str) -> Option<&'static SteamLanguage> {
    let id = id.trim();
    LANGUAGES.iter().find(|l| l.id.eq_ignore_ascii_case(id))
}

/// Resolves identifiers in order, dropping duplicates.
pub fn parse_list<S: AsRef<str>>(ids: &[S]) -> Result<Vec<&'static SteamLanguage>, ValidationError> {
    let mut out: Vec<&'static SteamLanguage> = Vec::with_capacity(ids.len());

    for id in ids {
        let id = id.as_ref();
        let lang = lookup(id).ok_or_else(|| ValidationError::UnknownLanguage(id.to_string()))?;
        if !out.contains(&lang) {
            out.push(lang);
        }
    }

    Ok(out)
}
