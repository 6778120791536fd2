use opshub_application::{TableDisplay, TableProps};
use opshub_domain::{AuditEvent, SortField, User};

/// One column of a text table.
pub struct Column<T> {
    pub header: &'static str,
    pub sort_field: Option<SortField>,
    pub cell: fn(&T) -> String,
}

pub fn user_columns() -> Vec<Column<User>> {
    vec![
        Column {
            header: "ID",
            sort_field: None,
            cell: |user| user.id.to_string(),
        },
        Column {
            header: "Name",
            sort_field: Some(SortField::Name),
            cell: User::display_name,
        },
        Column {
            header: "Email",
            sort_field: Some(SortField::Email),
            cell: |user| user.email.clone(),
        },
        Column {
            header: "Role",
            sort_field: None,
            cell: |user| user.role.map(|role| role.as_str()).unwrap_or("-").to_owned(),
        },
        Column {
            header: "Status",
            sort_field: None,
            cell: |user| user.status.as_str().to_owned(),
        },
        Column {
            header: "Created",
            sort_field: Some(SortField::CreatedAt),
            cell: |user| {
                user.created_at
                    .map(|created_at| created_at.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "-".to_owned())
            },
        },
    ]
}

pub fn audit_columns() -> Vec<Column<AuditEvent>> {
    vec![
        Column {
            header: "Occurred",
            sort_field: Some(SortField::OccurredAt),
            cell: |event| event.occurred_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        },
        Column {
            header: "Actor",
            sort_field: None,
            cell: |event| {
                event
                    .actor_user_id
                    .map(|user_id| user_id.to_string())
                    .unwrap_or_else(|| "system".to_owned())
            },
        },
        Column {
            header: "Action",
            sort_field: None,
            cell: |event| event.action.clone(),
        },
        Column {
            header: "Entity",
            sort_field: None,
            cell: |event| format!("{}:{}", event.entity_type, event.entity_id),
        },
        Column {
            header: "Summary",
            sort_field: None,
            cell: |event| event.summary.clone(),
        },
        Column {
            header: "Metadata",
            sort_field: None,
            cell: |event| event.metadata_text().unwrap_or_default(),
        },
    ]
}

/// Draws a table snapshot as plain text.
///
/// A loading or error banner is printed above the rows kept from the last
/// successful fetch.
pub fn render_table<T>(props: &TableProps<T>, columns: &[Column<T>]) -> String {
    let mut lines = Vec::new();

    match props.display() {
        TableDisplay::Loading => lines.push("Loading...".to_owned()),
        TableDisplay::Error(message) => lines.push(format!("Error: {message}")),
        TableDisplay::Empty(message) => lines.push(message.to_owned()),
        TableDisplay::Rows(_) => {}
    }

    if !props.rows.is_empty() {
        lines.extend(grid(props, columns));
    }

    lines.push(footer(props));
    lines.join("\n")
}

fn grid<T>(props: &TableProps<T>, columns: &[Column<T>]) -> Vec<String> {
    let headers: Vec<String> = columns
        .iter()
        .map(|column| {
            match column
                .sort_field
                .and_then(|field| props.sort_marker(field))
            {
                Some(marker) => format!("{} {marker}", column.header),
                None => column.header.to_owned(),
            }
        })
        .collect();
    let cells: Vec<Vec<String>> = props
        .rows
        .iter()
        .map(|row| columns.iter().map(|column| (column.cell)(row)).collect())
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(index, header)| {
            cells
                .iter()
                .map(|row| width(&row[index]))
                .chain(std::iter::once(width(header)))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut lines = vec![
        line(&headers, &widths),
        widths
            .iter()
            .map(|width| "-".repeat(*width))
            .collect::<Vec<_>>()
            .join("-+-"),
    ];
    lines.extend(cells.iter().map(|row| line(row, &widths)));
    lines
}

fn line(values: &[String], widths: &[usize]) -> String {
    values
        .iter()
        .zip(widths)
        .map(|(value, width)| {
            let padding = width.saturating_sub(self::width(value));
            format!("{value}{}", " ".repeat(padding))
        })
        .collect::<Vec<_>>()
        .join(" | ")
        .trim_end()
        .to_owned()
}

fn width(value: &str) -> usize {
    value.chars().count()
}

fn footer<T>(props: &TableProps<T>) -> String {
    let page = props.page;
    let last_row = page
        .first_row()
        .saturating_add(props.rows.len())
        .saturating_sub(1)
        .max(page.first_row());
    let sizes = page
        .allowed_sizes
        .iter()
        .map(|size| {
            if *size == page.size {
                format!("[{size}]")
            } else {
                size.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ");

    format!(
        "Page {} of {} | rows {}-{} of {} | size {sizes}{}{}",
        page.index.saturating_add(1),
        page.page_count(),
        page.first_row(),
        last_row,
        page.total_count,
        if page.has_previous() { " | prev" } else { "" },
        if page.has_next() { " | next" } else { "" },
    )
}
