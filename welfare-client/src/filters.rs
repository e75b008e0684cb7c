//! Фильтры поиска: регион и целевая группа.

/// Регионы: подпись на экране и значение параметра `area`.
pub const REGIONS: &[(&str, &str)] = &[
    ("서울", "서울특별시"),
    ("부산", "부산광역시"),
    ("대구", "대구광역시"),
    ("인천", "인천광역시"),
    ("광주", "광주광역시"),
    ("대전", "대전광역시"),
    ("울산", "울산광역시"),
    ("세종", "세종특별자치시"),
    ("경기", "경기도"),
    ("강원", "강원특별자치도"),
    ("충북", "충청북도"),
    ("충남", "충청남도"),
    ("전북", "전북특별자치도"),
    ("전남", "전라남도"),
    ("경북", "경상북도"),
    ("경남", "경상남도"),
    ("제주", "제주특별자치도"),
];

/// Целевые группы: подпись на экране и значение параметра `target`.
pub const TARGETS: &[(&str, &str)] = &[
    ("영유아", "INFANT"),
    ("아동", "CHILD"),
    ("청소년", "TEEN"),
    ("청년", "YOUTH"),
    ("중장년", "MIDDLE_AGED"),
    ("노년", "SENIOR"),
    ("장애인", "DISABLED"),
    ("저소득", "LOW_INCOME"),
    ("다문화", "MULTICULTURAL"),
];

fn lookup(table: &[(&'static str, &'static str)], label: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(known, _)| *known == label.trim())
        .map(|(_, code)| *code)
}

#[derive(Debug, Clone)]
/// Группа чипов с одиночным выбором.
///
/// Повторное нажатие на выбранный чип снимает выбор.
pub struct ChipGroup {
    options: &'static [(&'static str, &'static str)],
    selected: Option<usize>,
}

impl ChipGroup {
    /// Группа регионов.
    pub fn regions() -> Self {
        Self::new(REGIONS)
    }

    /// Группа целевых групп.
    pub fn targets() -> Self {
        Self::new(TARGETS)
    }

    /// Группа поверх произвольной таблицы `(подпись, код)`.
    pub fn new(options: &'static [(&'static str, &'static str)]) -> Self {
        Self {
            options,
            selected: None,
        }
    }

    /// Подписи всех чипов в порядке показа.
    pub fn labels(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.options.iter().map(|(label, _)| *label)
    }

    /// Переключает чип. Неизвестная подпись ничего не меняет.
    /// Возвращает выбранную после нажатия подпись.
    pub fn toggle(&mut self, label: &str) -> Option<&'static str> {
        if let Some(position) = self.options.iter().position(|(known, _)| *known == label) {
            self.selected = if self.selected == Some(position) {
                None
            } else {
                Some(position)
            };
        }
        self.selected_label()
    }

    /// Выбранная подпись.
    pub fn selected_label(&self) -> Option<&'static str> {
        self.selected.map(|position| self.options[position].0)
    }

    /// Код выбранного чипа для запроса.
    pub fn selected_code(&self) -> Option<&'static str> {
        self.selected.map(|position| self.options[position].1)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Параметры поиска программ.
pub struct SearchQuery {
    /// Код региона.
    pub area: Option<String>,
    /// Код целевой группы.
    pub target: Option<String>,
    /// Свободный вопрос пользователя.
    pub question: String,
}

impl SearchQuery {
    /// Запрос по тексту вопроса.
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            ..Self::default()
        }
    }

    /// Запрос из выбранных чипов.
    pub fn from_chips(question: impl Into<String>, regions: &ChipGroup, targets: &ChipGroup) -> Self {
        Self {
            area: regions.selected_code().map(str::to_string),
            target: targets.selected_code().map(str::to_string),
            question: question.into(),
        }
    }

    /// Задаёт регион по подписи; неизвестная подпись в запрос не попадает.
    pub fn with_area_label(mut self, label: &str) -> Self {
        self.area = lookup(REGIONS, label).map(str::to_string);
        self
    }

    /// Задаёт целевую группу по подписи; неизвестная подпись в запрос не попадает.
    pub fn with_target_label(mut self, label: &str) -> Self {
        self.target = lookup(TARGETS, label).map(str::to_string);
        self
    }

    /// Без текста вопроса поиск не выполняется.
    pub fn is_searchable(&self) -> bool {
        !self.question.trim().is_empty()
    }

    /// Параметры строки запроса в порядке `area`, `target`, `question`.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(3);
        if let Some(area) = &self.area {
            pairs.push(("area", area.clone()));
        }
        if let Some(target) = &self.target {
            pairs.push(("target", target.clone()));
        }
        pairs.push(("question", self.question.trim().to_string()));
        pairs
    }
}
