use scraper::{ElementRef, Html, Selector};

#[track_caller]
pub(crate) fn must_get_form(html: &Html) -> ElementRef<'_> {
    html.select(&Selector::parse("form").unwrap())
        .next()
        .expect("No form found")
}

#[track_caller]
pub(crate) fn assert_hx_endpoint(form: &ElementRef<'_>, endpoint: &str, attribute: &str) {
    let value = form
        .value()
        .attr(attribute)
        .unwrap_or_else(|| panic!("{attribute} attribute missing"));

    assert_eq!(
        value, endpoint,
        "want form with attribute {attribute}=\"{endpoint}\", got {value:?}"
    );
}

#[track_caller]
pub(crate) fn assert_file_input(form: &ElementRef<'_>, name: &str, accept: &str) {
    let input = form
        .select(&Selector::parse("input[type=file]").unwrap())
        .find(|input| input.value().attr("name") == Some(name))
        .unwrap_or_else(|| panic!("No file input found with name \"{name}\""));

    let got_accept = input.value().attr("accept").unwrap_or_default();
    assert_eq!(
        got_accept, accept,
        "want file input accepting \"{accept}\", got {got_accept:?}"
    );
    assert!(
        input.value().attr("required").is_some(),
        "want file input {name} to have the required attribute but got none"
    );
}

/// The `value` attribute of each option in the select named `name`.
#[track_caller]
pub(crate) fn select_options(form: &ElementRef<'_>, name: &str) -> Vec<String> {
    let select = form
        .select(&Selector::parse("select").unwrap())
        .find(|select| select.value().attr("name") == Some(name))
        .unwrap_or_else(|| panic!("No select found with name \"{name}\""));

    select
        .select(&Selector::parse("option").unwrap())
        .map(|option| option.value().attr("value").unwrap_or_default().to_owned())
        .collect()
}
