//! Форматирование чисел для карточек дашборда

/// Заглушка для отсутствующего значения
pub const PLACEHOLDER: &str = "—";

/// Форматирует число с разделителем тысяч (пробел) и указанным количеством знаков после запятой
///
/// # Примеры
/// ```
/// use analytics::shared::format::format_number_with_decimals;
/// assert_eq!(format_number_with_decimals(1234.567, 2), "1 234.57");
/// ```
pub fn format_number_with_decimals(value: f64, decimals: u8) -> String {
    let formatted = format!("{:.*}", decimals as usize, value);

    let (integer_part, decimal_part) = match formatted.split_once('.') {
        Some((i, d)) => (i, Some(d)),
        None => (formatted.as_str(), None),
    };

    // Вставляем пробелы каждые 3 цифры с конца целой части
    let mut result = String::new();
    for (i, c) in integer_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 && c != '-' {
            result.push(' ');
        }
        result.push(c);
    }
    let formatted_integer: String = result.chars().rev().collect();

    match decimal_part {
        Some(d) => format!("{}.{}", formatted_integer, d),
        None => formatted_integer,
    }
}

/// "1 234.57 ₽"
pub fn format_money(value: f64) -> String {
    format!("{} ₽", format_number_with_decimals(value, 2))
}

/// "80.0%"
pub fn format_percent(value: f64) -> String {
    format!("{}%", format_number_with_decimals(value, 1))
}

/// Относительное изменение со знаком: "+12.5%"
pub fn format_percent_change(value: f64) -> String {
    format!("{}{}%", sign(value), format_number_with_decimals(value.abs(), 1))
}

/// Изменение в процентных пунктах: "-3.2 п.п."
pub fn format_pp_delta(value: f64) -> String {
    format!("{}{} п.п.", sign(value), format_number_with_decimals(value.abs(), 1))
}

/// Форматирует значение или возвращает заглушку
pub fn format_optional(value: Option<f64>, format: impl Fn(f64) -> String) -> String {
    match value {
        Some(v) if v.is_finite() => format(v),
        _ => PLACEHOLDER.to_string(),
    }
}

fn sign(value: f64) -> &'static str {
    if value > 0.0 {
        "+"
    } else if value < 0.0 {
        "-"
    } else {
        ""
    }
}
