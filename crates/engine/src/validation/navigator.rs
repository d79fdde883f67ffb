//! "Jump to the Nth error" bookkeeping for the information item table.

use rescat_types::{InformationItem, ItemAttribute, RowId};
use serde::Serialize;

/// Position of one invalid cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorLocation {
    pub row: usize,
    pub row_id: RowId,
    pub attribute: ItemAttribute,
    pub message: String,
}

/// Cycles through invalid cells in row-major, column order.
///
/// The cursor starts before the first error so the first call to
/// [`ErrorNavigator::next`] lands on it, which is the cell the UI scrolls into view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorNavigator {
    locations: Vec<ErrorLocation>,
    cursor: Option<usize>,
}

impl ErrorNavigator {
    pub fn from_items(items: &[InformationItem]) -> Self {
        let locations = items
            .iter()
            .enumerate()
            .flat_map(|(row, item)| {
                item.error_tips.iter().map(move |(attribute, message)| ErrorLocation {
                    row,
                    row_id: item.id.clone(),
                    attribute: *attribute,
                    message: message.clone(),
                })
            })
            .collect();
        Self { locations, cursor: None }
    }

    pub fn total(&self) -> usize {
        self.locations.len()
    }

    pub fn first(&self) -> Option<&ErrorLocation> {
        self.locations.first()
    }

    pub fn current(&self) -> Option<&ErrorLocation> {
        self.cursor.and_then(|index| self.locations.get(index))
    }

    /// One-based position of the cursor, as shown in the "N / total" indicator.
    pub fn position(&self) -> Option<usize> {
        self.cursor.map(|index| index + 1)
    }

    pub fn next(&mut self) -> Option<&ErrorLocation> {
        if self.locations.is_empty() {
            return None;
        }
        let next = match self.cursor {
            Some(index) => (index + 1) % self.locations.len(),
            None => 0,
        };
        self.cursor = Some(next);
        self.locations.get(next)
    }

    pub fn previous(&mut self) -> Option<&ErrorLocation> {
        if self.locations.is_empty() {
            return None;
        }
        let last = self.locations.len() - 1;
        let previous = match self.cursor {
            Some(0) | None => last,
            Some(index) => index - 1,
        };
        self.cursor = Some(previous);
        self.locations.get(previous)
    }

    pub fn locations(&self) -> &[ErrorLocation] {
        &self.locations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<InformationItem> {
        let mut first = InformationItem::new(RowId::Draft(0));
        first.error_tips.insert(ItemAttribute::BusinessName, "a".into());
        first.error_tips.insert(ItemAttribute::SharedType, "b".into());
        let clean = InformationItem::new(RowId::Draft(1));
        let mut third = InformationItem::new(RowId::Persisted("c3".into()));
        third.error_tips.insert(ItemAttribute::DataLength, "c".into());
        vec![first, clean, third]
    }

    #[test]
    fn walks_errors_forward_and_wraps() {
        let mut navigator = ErrorNavigator::from_items(&rows());
        assert_eq!(navigator.total(), 3);
        assert!(navigator.current().is_none());

        assert_eq!(navigator.next().map(|l| l.attribute), Some(ItemAttribute::BusinessName));
        assert_eq!(navigator.next().map(|l| l.attribute), Some(ItemAttribute::SharedType));
        let third = navigator.next().cloned().expect("third error");
        assert_eq!(third.row, 2);
        assert_eq!(third.row_id, RowId::Persisted("c3".into()));
        assert_eq!(navigator.position(), Some(3));
        assert_eq!(navigator.next().map(|l| l.row), Some(0));
    }

    #[test]
    fn walks_backwards_from_the_start() {
        let mut navigator = ErrorNavigator::from_items(&rows());
        assert_eq!(navigator.previous().map(|l| l.attribute), Some(ItemAttribute::DataLength));
        assert_eq!(navigator.previous().map(|l| l.attribute), Some(ItemAttribute::SharedType));
    }

    #[test]
    fn empty_navigator_stays_empty() {
        let mut navigator = ErrorNavigator::from_items(&[]);
        assert!(navigator.next().is_none());
        assert!(navigator.previous().is_none());
        assert!(navigator.first().is_none());
    }
}
