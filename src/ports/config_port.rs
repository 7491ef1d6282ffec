//! Configuration access port trait.

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    /// `Ok(None)` if the key is absent, `Err` if present but not an integer.
    fn try_get_int(&self, section: &str, key: &str) -> Result<Option<i64>, String>;
    /// `Ok(None)` if the key is absent, `Err` if present but not a number.
    fn try_get_double(&self, section: &str, key: &str) -> Result<Option<f64>, String>;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;

    /// Whitespace- or comma-separated list; `None` if the key is absent.
    fn get_list(&self, section: &str, key: &str) -> Option<Vec<String>> {
        self.get_string(section, key).map(|raw| {
            raw.split(|c: char| c.is_whitespace() || c == ',')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
    }
}
