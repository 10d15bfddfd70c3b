use forgeplan_core::ItemId;

use crate::supplier::Supplier;

/// The highest-rated supplier linked to `item_id`.
///
/// Ties keep the first supplier encountered; `None` when nobody supplies the item.
pub fn recommend_for_item<'a, I>(suppliers: I, item_id: ItemId) -> Option<&'a Supplier>
where
    I: IntoIterator<Item = &'a Supplier>,
{
    suppliers
        .into_iter()
        .filter(|s| s.supplies(item_id))
        .fold(None, |best: Option<&Supplier>, candidate| match best {
            Some(b) if b.rating() >= candidate.rating() => Some(b),
            _ => Some(candidate),
        })
}
