pub mod compute;

use contracts::shared::indicators::{ChangeKind, IndicatorValue, ValueFormat};

use crate::shared::format::{
    format_money, format_number_with_decimals, format_optional, format_percent_change,
    format_pp_delta, PLACEHOLDER,
};

/// Текстовое представление карточки показателя
pub trait IndicatorDisplay {
    /// Значение, подсказка (если причина отсутствия известна) или заглушка
    fn display_value(&self) -> String;
    /// Изменение к прошлому периоду со знаком, если оно посчитано
    fn display_change(&self) -> Option<String>;
}

impl IndicatorDisplay for IndicatorValue {
    fn display_value(&self) -> String {
        match (self.value, &self.hint) {
            (None, Some(hint)) => hint.clone(),
            (None, None) => PLACEHOLDER.to_string(),
            (Some(_), _) => match &self.format {
                ValueFormat::Money { .. } => format_optional(self.value, format_money),
                ValueFormat::Percent { decimals } => format_optional(self.value, |v| {
                    format!("{}%", format_number_with_decimals(v, *decimals))
                }),
            },
        }
    }

    fn display_change(&self) -> Option<String> {
        let change = self.change.filter(|c| c.is_finite())?;
        Some(match self.change_kind {
            ChangeKind::Percent => format_percent_change(change),
            ChangeKind::PercentagePoints => format_pp_delta(change),
        })
    }
}
