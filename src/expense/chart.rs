//! The spending-by-category chart on the expense overview.
//!
//! The chart is generated as an ECharts configuration with charming and
//! initialised by a small script in the page head.

use std::collections::BTreeMap;

use charming::{
    Chart,
    component::{Axis, Grid, Title},
    element::{AxisLabel, AxisPointer, AxisPointerType, AxisType, JsFunction, Tooltip, Trigger},
    series::bar::Bar,
};
use maud::{Markup, PreEscaped, html};

use crate::{expense::Category, html::HeadElement};

/// The HTML element ID of the chart container.
pub(super) const CATEGORY_CHART_ID: &str = "category-chart";

pub(super) fn category_chart(chart_data: &BTreeMap<Category, f64>) -> Chart {
    let labels: Vec<&str> = Category::ALL.iter().map(Category::as_str).collect();
    let values: Vec<f64> = Category::ALL
        .iter()
        .map(|category| chart_data.get(category).copied().unwrap_or(0.0))
        .collect();

    Chart::new()
        .title(Title::new().text("Spending by category"))
        .tooltip(currency_tooltip())
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter())),
        )
        .series(Bar::new().name("Spent").data(values))
}

pub(super) fn chart_view() -> Markup {
    html!(
        section id="charts" class="w-full mx-auto mb-4"
        {
            div id=(CATEGORY_CHART_ID) class="min-h-[380px] rounded dark:bg-gray-100" {}
        }
    )
}

/// Script that renders `chart` into the chart container once the page has loaded.
pub(super) fn chart_script(chart: &Chart) -> HeadElement {
    let script = format!(
        r#"document.addEventListener('DOMContentLoaded', function() {{
            const chart = echarts.init(document.getElementById("{CATEGORY_CHART_ID}"));
            chart.setOption({});
            window.addEventListener('resize', chart.resize);

            const darkModeMediaQuery = window.matchMedia('(prefers-color-scheme: dark)');
            const updateTheme = () => {{
                chart.setTheme(darkModeMediaQuery.matches ? 'dark' : 'default');
            }};
            darkModeMediaQuery.addEventListener('change', updateTheme);
            updateTheme();
        }});"#,
        chart
    );

    HeadElement::ScriptSource(PreEscaped(script))
}

#[inline]
fn currency_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "number",
        "const currencyFormatter = new Intl.NumberFormat('en-US', {
              style: 'currency',
              currency: 'USD'
            });
            return (number) ? currencyFormatter.format(number) : \"-\";",
    )
}

fn currency_tooltip() -> Tooltip {
    Tooltip::new()
        .trigger(Trigger::Axis)
        .value_formatter(currency_formatter())
        .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow))
}
