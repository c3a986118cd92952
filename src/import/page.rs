use axum::response::{IntoResponse, Response};
use maud::{Markup, html};

use crate::{
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base, loading_spinner},
    navigation::NavBar,
};

const ACCEPTED_FILES: &str = ".xml,.csv";

fn import_form_view() -> Markup {
    let spinner = loading_spinner();

    html! {
        form
            hx-post=(endpoints::IMPORT)
            enctype="multipart/form-data"
            hx-disabled-elt="#files, #submit-button"
            hx-indicator="#indicator"
            hx-swap="none"
            hx-target-error="#alert-container"
            class="space-y-4 md:space-y-6"
        {
            div
            {
                label for="files" class=(FORM_LABEL_STYLE)
                {
                    "Choose file(s) to upload"
                }

                input
                    id="files"
                    type="file"
                    name="files"
                    accept=(ACCEPTED_FILES)
                    multiple
                    required
                    class=(FORM_TEXT_INPUT_STYLE);

                p class="mt-2 text-sm text-gray-600 dark:text-gray-400"
                {
                    "Upload an SMS backup (.xml) exported from your phone, or a MoMo
                    statement (.csv) with the columns Timestamp, Type, Amount, Phone,
                    Reference and Message. Files you have uploaded before are safe to
                    upload again, transactions are only stored once."
                }
            }

            button
                type="submit"
                id="submit-button"
                class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator" { (spinner) }
                " Upload Files"
            }
        }
    }
}

fn import_view() -> Markup {
    let nav_bar = NavBar::new(endpoints::IMPORT_VIEW).into_html();
    let form = import_form_view();

    let content = html! {
        (nav_bar)

        div
            class="flex flex-col items-center px-6 py-8 mx-auto
            text-gray-900 dark:text-white"
        {
            div class="relative max-w-md w-full"
            {
                h1 class="mb-4 text-2xl font-bold" { "Import Transactions" }

                (form)
            }
        }
    };

    base("Import Transactions", &[], &content)
}

/// Route handler for the import page.
pub async fn get_import_page() -> Response {
    import_view().into_response()
}
