//! Top-level domain whitelist for trailing-punctuation decisions.
//!
//! A URL candidate that ends in one of these suffixes keeps its final
//! characters as part of the domain; anything else loses trailing sentence
//! punctuation before it is linked.

#[cfg(test)]
#[path = "tld_test.rs"]
mod tld_test;

/// Common top-level domains, sorted for binary search.
pub const COMMON_TLDS: &[&str] = &[
    "ae", "ai", "ao", "app", "ar", "asia", "at", "au", "bd", "be", "bf", "bg", "bi", "biz", "bj",
    "blog", "br", "bw", "ca", "cc", "cd", "cf", "cg", "ch", "ci", "cloud", "cm", "cn", "co", "com",
    "cz", "de", "dev", "digital", "dj", "dk", "dz", "edu", "ee", "eg", "email", "er", "es", "et",
    "eu", "fi", "fm", "fr", "ga", "gg", "gh", "global", "gm", "gn", "gov", "gq", "gr", "gu", "gw",
    "hk", "hr", "hu", "id", "ie", "il", "in", "info", "int", "io", "is", "it", "jobs", "jp", "ke",
    "kr", "kw", "link", "live", "lr", "lt", "lu", "lv", "ly", "ma", "me", "media", "mg", "mil",
    "ml", "mobi", "mr", "mu", "mx", "my", "na", "name", "ne", "net", "news", "ng", "nl", "no",
    "np", "nz", "om", "online", "org", "page", "ph", "pk", "pl", "pro", "pt", "qa", "ro", "ru",
    "rw", "sa", "sc", "sd", "se", "sg", "shop", "si", "site", "sk", "sl", "so", "space", "st",
    "store", "td", "tech", "tel", "tg", "th", "tn", "to", "tr", "travel", "tv", "tw", "tz", "ua",
    "ug", "uk", "us", "vn", "website", "xyz", "za", "zw",
];

/// Whether `tld` (without the dot, any case) is in [`COMMON_TLDS`].
#[must_use]
pub fn is_common_tld(tld: &str) -> bool {
    if tld.len() < 2 || !tld.bytes().all(|b| b.is_ascii_alphabetic()) {
        return false;
    }
    COMMON_TLDS.binary_search(&tld.to_ascii_lowercase().as_str()).is_ok()
}

/// Whether `candidate` ends in `.tld` for a whitelisted TLD.
#[must_use]
pub fn ends_with_common_tld(candidate: &str) -> bool {
    candidate
        .rsplit_once('.')
        .is_some_and(|(head, tld)| !head.is_empty() && is_common_tld(tld))
}
