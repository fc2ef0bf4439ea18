/// Read-only queries over a loaded [`Corpus`].
///
/// Sequences are returned as borrowed iterators: each call starts a fresh pass in
/// document order, and the returned iterators are `Clone` so a consumer can restart them.
use crate::error::AppError;
use crate::model::{Corpus, GuidelineSection, Label};

impl Corpus {
    /// All sections in document order.
    pub fn list_sections(&self) -> impl Iterator<Item = &GuidelineSection> + Clone + '_ {
        self.sections_slice().iter()
    }

    /// Exact, case-sensitive title lookup.
    pub fn find_section(&self, title: &str) -> Result<&GuidelineSection, AppError> {
        self.index_of(title)
            .and_then(|i| self.sections_slice().get(i))
            .ok_or_else(|| AppError::NotFound(title.to_string()))
    }

    /// Sections holding at least one example tagged `label`, in corpus order.
    pub fn sections_by_label_presence(
        &self,
        label: Label,
    ) -> impl Iterator<Item = &GuidelineSection> + Clone + '_ {
        self.list_sections().filter(move |s| s.has_label(label))
    }

    /// Sections of one category in corpus order. The category name is matched
    /// case-insensitively.
    pub fn sections_in_category(
        &self,
        name: &str,
    ) -> Result<impl Iterator<Item = &GuidelineSection> + Clone + '_, AppError> {
        let category = self
            .categories()
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| {
                let available: Vec<&str> =
                    self.categories().iter().map(|c| c.name.as_str()).collect();
                AppError::UnknownCategory(format!(
                    "'{}'. Available categories: {}",
                    name.trim(),
                    available.join(", ")
                ))
            })?;
        let key = category.name.as_str();
        Ok(self
            .list_sections()
            .filter(move |s| s.category.as_deref() == Some(key)))
    }
}
