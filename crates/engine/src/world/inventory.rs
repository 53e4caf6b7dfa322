pub const INVENTORY_CAPACITY: usize = 64;

/// Ordered, bounded list of item identifiers. Duplicates are kept as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    items: Vec<String>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut inventory = Self::new();
        for item in items {
            // Items past capacity are dropped.
            let _ = inventory.add(item);
        }
        inventory
    }

    /// Appends `item`, handing it back when the inventory is full.
    pub fn add(&mut self, item: impl Into<String>) -> Result<(), String> {
        let item = item.into();
        if self.is_full() {
            return Err(item);
        }
        self.items.push(item);
        Ok(())
    }

    /// Moves every item out, leaving this inventory empty.
    pub fn take_all(&mut self) -> Vec<String> {
        std::mem::take(&mut self.items)
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn contains(&self, item: &str) -> bool {
        self.items.iter().any(|held| held == item)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= INVENTORY_CAPACITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_keeps_order_and_duplicates() {
        let mut inventory = Inventory::new();
        inventory.add("potion").expect("room");
        inventory.add("bread").expect("room");
        inventory.add("potion").expect("room");
        assert_eq!(inventory.items(), ["potion", "bread", "potion"]);
    }

    #[test]
    fn add_rejects_past_capacity_and_returns_item() {
        let mut inventory = Inventory::new();
        for index in 0..INVENTORY_CAPACITY {
            inventory.add(format!("item_{index}")).expect("room");
        }
        assert!(inventory.is_full());
        assert_eq!(inventory.add("overflow"), Err("overflow".to_string()));
        assert_eq!(inventory.len(), INVENTORY_CAPACITY);
    }

    #[test]
    fn take_all_leaves_empty_valid_inventory() {
        let mut inventory = Inventory::with_items(["orc_tooth", "gold_coin"]);
        let taken = inventory.take_all();
        assert_eq!(taken, vec!["orc_tooth", "gold_coin"]);
        assert!(inventory.is_empty());
        inventory.add("again").expect("reusable after drain");
        assert!(inventory.contains("again"));
    }
}
