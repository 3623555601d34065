use std::collections::HashSet;
use std::hash::Hash;

/// Максимум одновременно выбранных заказов/поставок в списках
pub const MAX_SELECTED_ITEMS: usize = 1000;

/// Множественный выбор строк списка с ограничением размера.
///
/// Порядок выбора сохраняется; попытка выбрать сверх лимита ничего не меняет.
#[derive(Debug, Clone)]
pub struct BoundedSelection<T> {
    limit: usize,
    order: Vec<T>,
    ids: HashSet<T>,
}

impl<T: Eq + Hash + Clone> BoundedSelection<T> {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            order: Vec::new(),
            ids: HashSet::new(),
        }
    }

    /// Выбрать элемент; `false`, если он уже выбран или лимит исчерпан
    pub fn select(&mut self, id: T) -> bool {
        if self.ids.contains(&id) || self.is_full() {
            return false;
        }
        self.ids.insert(id.clone());
        self.order.push(id);
        true
    }

    pub fn deselect(&mut self, id: &T) -> bool {
        if !self.ids.remove(id) {
            return false;
        }
        self.order.retain(|x| x != id);
        true
    }

    /// Переключить выбор; возвращает, выбран ли элемент после вызова
    pub fn toggle(&mut self, id: T) -> bool {
        if self.ids.contains(&id) {
            self.deselect(&id);
            false
        } else {
            self.select(id)
        }
    }

    /// "Выбрать все": добавляет элементы по порядку, пока не упрётся в лимит.
    /// Возвращает количество добавленных.
    pub fn select_all<I: IntoIterator<Item = T>>(&mut self, items: I) -> usize {
        let mut added = 0;
        for id in items {
            if self.is_full() {
                break;
            }
            if self.select(id) {
                added += 1;
            }
        }
        added
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.ids.clear();
    }

    pub fn contains(&self, id: &T) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.order.len() >= self.limit
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Выбранные элементы в порядке выбора
    pub fn items(&self) -> &[T] {
        &self.order
    }
}

impl<T: Eq + Hash + Clone> Default for BoundedSelection<T> {
    fn default() -> Self {
        Self::new(MAX_SELECTED_ITEMS)
    }
}
