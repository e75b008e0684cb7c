//! Постраничный вывод списков.
//!
//! Один тип `Paginator` обслуживает все списки приложения: результаты поиска
//! (весь набор на клиенте, окно считается локально) и доску (сервер отдаёт
//! одну страницу и общее число страниц).
//!
//! Инвариант: `current_page` всегда лежит в `[1, max(total_pages, 1)]`.
//! Пустой список всё равно показывает один неактивный номер страницы `1`.

use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
/// Ошибки параметров пагинации.
pub enum PaginationError {
    /// Размер страницы должен быть положительным.
    #[error("page size must be greater than zero")]
    ZeroPageSize,
}

/// Число страниц для `item_count` элементов; `0` для пустого списка.
pub fn total_pages(item_count: usize, page_size: usize) -> u32 {
    if page_size == 0 {
        return 0;
    }
    u32::try_from(item_count.div_ceil(page_size)).unwrap_or(u32::MAX)
}

/// Срез `items` для страницы `page` (нумерация с 1). Вне диапазона пусто.
pub fn page_window<T>(items: &[T], page: u32, page_size: usize) -> &[T] {
    if page == 0 || page_size == 0 {
        return &[];
    }
    let start = (page as usize - 1).saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    /// Весь набор на клиенте.
    Local { page_size: usize },
    /// Только текущая страница, число страниц задаёт сервер.
    Remote { total_pages: u32 },
}

#[derive(Debug, Clone)]
/// Состояние постраничного списка.
pub struct Paginator<T> {
    items: Vec<T>,
    current_page: u32,
    source: Source,
}

impl<T> Paginator<T> {
    /// Список, который целиком хранится на клиенте и режется на страницы по `page_size`.
    pub fn local(items: Vec<T>, page_size: usize) -> Result<Self, PaginationError> {
        if page_size == 0 {
            return Err(PaginationError::ZeroPageSize);
        }
        Ok(Self {
            items,
            current_page: 1,
            source: Source::Local { page_size },
        })
    }

    /// Одна страница, описанная сервером.
    ///
    /// `current_page` приводится к допустимому диапазону.
    pub fn remote(items: Vec<T>, current_page: u32, total_pages: u32) -> Self {
        let mut paginator = Self {
            items,
            current_page: 1,
            source: Source::Remote { total_pages },
        };
        paginator.current_page = paginator.clamp(current_page);
        paginator
    }

    fn clamp(&self, page: u32) -> u32 {
        page.clamp(1, self.total_pages().max(1))
    }

    /// Общее число страниц.
    pub fn total_pages(&self) -> u32 {
        match self.source {
            Source::Local { page_size } => total_pages(self.items.len(), page_size),
            Source::Remote { total_pages } => total_pages,
        }
    }

    /// Текущая страница (с 1).
    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    /// Размер страницы для локального списка.
    pub fn page_size(&self) -> Option<usize> {
        match self.source {
            Source::Local { page_size } => Some(page_size),
            Source::Remote { .. } => None,
        }
    }

    /// Пуст ли список.
    pub fn is_empty(&self) -> bool {
        self.total_pages() == 0
    }

    /// Все хранимые элементы (для удалённого списка это текущая страница).
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Элементы, видимые на текущей странице.
    pub fn visible(&self) -> &[T] {
        match self.source {
            Source::Local { page_size } => page_window(&self.items, self.current_page, page_size),
            Source::Remote { .. } => &self.items,
        }
    }

    /// Переход на страницу `page`.
    ///
    /// Ничего не делает для пустого списка и для номеров вне `[1, total_pages]`.
    /// Возвращает `true`, если текущая страница изменилась. Для удалённого
    /// списка после этого нужно загрузить страницу и передать её в `replace_page`.
    pub fn on_page_change(&mut self, page: u32) -> bool {
        let total = self.total_pages();
        if total == 0 || page == 0 || page > total || page == self.current_page {
            return false;
        }
        self.current_page = page;
        true
    }

    /// Заменяет набор локального списка (новый поиск) и возвращается на страницу 1.
    pub fn replace_items(&mut self, items: Vec<T>) {
        self.items = items;
        self.current_page = 1;
    }

    /// Подставляет загруженную с сервера страницу.
    pub fn replace_page(&mut self, items: Vec<T>, total_pages: u32) {
        self.items = items;
        if let Source::Remote { .. } = self.source {
            self.source = Source::Remote { total_pages };
        }
        self.current_page = self.clamp(self.current_page);
    }

    /// Состояние элемента управления пагинацией.
    pub fn controls(&self) -> PageControls {
        PageControls::new(self.current_page, self.total_pages())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Кнопка элемента управления пагинацией.
pub struct PageButton {
    /// Подпись.
    pub label: String,
    /// Страница, на которую ведёт кнопка; `None` у неактивных кнопок.
    pub target: Option<u32>,
    /// Текущая страница.
    pub active: bool,
    /// Кнопка заблокирована.
    pub disabled: bool,
}

impl PageButton {
    fn arrow(label: &str, target: Option<u32>) -> Self {
        Self {
            label: label.to_string(),
            disabled: target.is_none(),
            target,
            active: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Элемент управления: «назад», номера страниц, «вперёд».
pub struct PageControls {
    /// Кнопка «назад».
    pub prev: PageButton,
    /// Номера страниц.
    pub pages: Vec<PageButton>,
    /// Кнопка «вперёд».
    pub next: PageButton,
}

impl PageControls {
    /// Строит элемент управления для страницы `current` из `total`.
    pub fn new(current: u32, total: u32) -> Self {
        if total == 0 {
            return Self {
                prev: PageButton::arrow("<", None),
                pages: vec![PageButton {
                    label: "1".to_string(),
                    target: None,
                    active: true,
                    disabled: false,
                }],
                next: PageButton::arrow(">", None),
            };
        }

        let prev = (current > 1).then(|| current - 1);
        let next = (current < total).then(|| current + 1);
        let pages = (1..=total)
            .map(|page| PageButton {
                label: page.to_string(),
                target: Some(page),
                active: page == current,
                disabled: false,
            })
            .collect();

        Self {
            prev: PageButton::arrow("<", prev),
            pages,
            next: PageButton::arrow(">", next),
        }
    }

    /// Страница, на которую ведёт нажатие кнопки с подписью `label`.
    pub fn target_of(&self, label: &str) -> Option<u32> {
        std::iter::once(&self.prev)
            .chain(self.pages.iter())
            .chain(std::iter::once(&self.next))
            .find(|button| button.label == label && !button.disabled)
            .and_then(|button| button.target)
    }
}

impl fmt::Display for PageControls {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let render = |button: &PageButton| {
            if button.active {
                format!("[{}]", button.label)
            } else if button.disabled {
                format!("({})", button.label)
            } else {
                button.label.clone()
            }
        };

        let mut parts = vec![render(&self.prev)];
        parts.extend(self.pages.iter().map(render));
        parts.push(render(&self.next));
        write!(f, "{}", parts.join(" "))
    }
}
