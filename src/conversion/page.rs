use chrono::Local;

use crate::conversion::model::Conversion;

pub const MISSING_PARAMS_MESSAGE: &str = "Please provide both 'from' and 'to' currencies.";

/// Values echoed back into the converter form.
#[derive(Debug, Default)]
pub struct FormValues {
    pub from: String,
    pub to: String,
    pub amount: String,
}

pub enum Outcome<'a> {
    Converted(&'a Conversion),
    Failed(&'a str),
}

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>Currency Converter</title>
    <style>
        body { font-family: Arial; max-width: 600px; margin: 20px auto; padding: 20px; }
        .container { background-color: #f0f0f0; border-radius: 5px; padding: 20px; }
        .rate { font-size: 22px; font-weight: bold; margin: 10px 0; }
        .info { font-size: 14px; color: gray; }
        .error { color: red; }
    </style>
</head>
<body>
    <div class="container">
        <h2>Currency Converter</h2>
"#;

const PAGE_TAIL: &str = r#"    </div>
</body>
</html>
"#;

pub fn render(form: &FormValues, outcome: Option<Outcome<'_>>) -> String {
    let mut page = String::from(PAGE_HEAD);

    page.push_str(&format!(
        r#"        <form method="get" action="/convert">
            <label>Amount: <input type="text" name="amount" value="{amount}" placeholder="1"></label><br><br>
            <label>From Currency: <input type="text" name="from" value="{from}" required></label><br><br>
            <label>To Currency: <input type="text" name="to" value="{to}" required></label><br><br>
            <button type="submit">Convert</button>
        </form>
        <hr>
"#,
        amount = escape_html(&form.amount),
        from = escape_html(&form.from),
        to = escape_html(&form.to),
    ));

    match outcome {
        Some(Outcome::Failed(message)) => {
            page.push_str(&format!(
                "        <p class=\"error\">{}</p>\n",
                escape_html(message)
            ));
        }
        Some(Outcome::Converted(conversion)) => {
            let from = escape_html(&conversion.from_currency);
            let to = escape_html(&conversion.to_currency);
            if conversion.original_amount == 1.0 {
                page.push_str(&format!(
                    "        <p class=\"rate\">1 {} = {} {}</p>\n",
                    from, conversion.market_rate, to
                ));
            } else {
                page.push_str(&format!(
                    "        <p class=\"rate\">{} {} = {:.2} {}</p>\n        <p>Rate: 1 {} = {} {}</p>\n",
                    conversion.original_amount, from, conversion.converted_amount, to, from, conversion.market_rate, to
                ));
            }
            let date = conversion
                .date
                .as_deref()
                .map(escape_html)
                .unwrap_or_else(|| conversion.timestamp.format("%Y-%m-%d").to_string());
            page.push_str(&format!(
                "        <p class=\"info\">Date: {} | Local Time: {}</p>\n",
                date,
                Local::now().format("%Y-%m-%d %H:%M:%S")
            ));
        }
        None => {}
    }

    page.push_str(PAGE_TAIL);
    page
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn conversion(amount: f64, converted: f64, rate: f64) -> Conversion {
        Conversion {
            original_amount: amount,
            from_currency: "USD".into(),
            to_currency: "EUR".into(),
            converted_amount: converted,
            rate,
            market_rate: rate,
            date: Some("2024-05-01".into()),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn empty_form() {
        let page = render(&FormValues::default(), None);
        assert!(page.contains("Currency Converter"));
        assert!(page.contains(r#"action="/convert""#));
        assert!(!page.contains("class=\"rate\""));
        assert!(!page.contains("<p class=\"error\">"));
    }

    #[test]
    fn unit_rate_line() {
        let result = conversion(1.0, 0.9, 0.9);
        let page = render(&FormValues::default(), Some(Outcome::Converted(&result)));
        assert!(page.contains("1 USD = 0.9 EUR"));
        assert!(page.contains("Date: 2024-05-01 | Local Time: "));
    }

    #[test]
    fn converted_amount_line() {
        let result = conversion(100.0, 90.0, 0.9);
        let page = render(&FormValues::default(), Some(Outcome::Converted(&result)));
        assert!(page.contains("100 USD = 90.00 EUR"));
        assert!(page.contains("Rate: 1 USD = 0.9 EUR"));
    }

    #[test]
    fn small_rates_show_provider_precision() {
        let mut result = conversion(1.0, 0.0, 0.0);
        result.from_currency = "IDR".into();
        result.to_currency = "USD".into();
        result.market_rate = 0.0000625;
        let page = render(&FormValues::default(), Some(Outcome::Converted(&result)));
        assert!(page.contains("1 IDR = 0.0000625 USD"));

        let mut result = conversion(500.0, 3.2, 0.0064);
        result.from_currency = "KRW".into();
        result.to_currency = "JPY".into();
        let page = render(&FormValues::default(), Some(Outcome::Converted(&result)));
        assert!(page.contains("500 KRW = 3.20 JPY"));
        assert!(page.contains("Rate: 1 KRW = 0.0064 JPY"));
    }

    #[test]
    fn error_and_form_values_are_escaped() {
        let form = FormValues {
            from: "<script>".into(),
            to: "EUR".into(),
            amount: String::new(),
        };
        let page = render(&form, Some(Outcome::Failed("bad \"input\" & more")));
        assert!(page.contains("value=\"&lt;script&gt;\""));
        assert!(page.contains("bad &quot;input&quot; &amp; more"));
        assert!(!page.contains("<script>"));
    }
}
