use iced::{
    Color, Element, Length, Theme, border,
    widget::{button, column, container, container::Style, row, text},
};
use iced_widget::container::bordered_box;

use crate::gui::screens::Page;

/// Width of labels in parameter forms.
pub const LABEL_WIDTH: f32 = 200.0;
/// Width of inputs in parameter forms.
pub const INPUT_WIDTH: f32 = 300.0;

impl Page {
    fn style(self, current: Self) -> impl Fn(&Theme) -> Style {
        move |theme: &Theme| {
            let style = bordered_box(theme).border(border::width(2));
            // darken the active page
            if self == current {
                let mut color_rgba = theme.palette().background.into_rgba8();
                color_rgba[0] /= 2;
                color_rgba[1] /= 2;
                color_rgba[2] /= 2;
                style.background(Color::from_rgb8(color_rgba[0], color_rgba[1], color_rgba[2]))
            } else {
                style.background(theme.palette().background)
            }
        }
    }
}

pub fn nav_entry<'a, Message>(page: Page, current: Page, on_press: Message) -> Element<'a, Message>
where
    Message: Clone + 'a,
{
    container(
        button(text(page.title()))
            .width(Length::Fill)
            .style(button::text)
            .on_press(on_press),
    )
    .style(page.style(current))
    .padding(4)
    .into()
}

/// Sidebar on the left, page content on the right.
pub fn layout<'a, Message>(
    sidebar: impl Into<Element<'a, Message>>,
    main_content: impl Into<Element<'a, Message>>,
) -> Element<'a, Message>
where
    Message: 'a,
{
    container(row![
        container(sidebar.into())
            .padding(10)
            .height(Length::Fill)
            .width(Length::Fixed(230.0)),
        container(main_content.into())
            .padding(10)
            .width(Length::Fill)
            .height(Length::Fill),
    ])
    .center_x(Length::Fill)
    .center_y(Length::Fill)
    .into()
}

/// `label: control` row of a parameter form.
pub fn form_row<'a, Message>(
    label: impl text::IntoFragment<'a>,
    control: impl Into<Element<'a, Message>>,
) -> Element<'a, Message>
where
    Message: 'a,
{
    row![
        text(label).width(Length::Fixed(LABEL_WIDTH)),
        control.into(),
    ]
    .spacing(10)
    .align_y(iced::Alignment::Center)
    .into()
}

/// Titled, bordered block.
pub fn group<'a, Message>(
    title: impl text::IntoFragment<'a>,
    content: impl Into<Element<'a, Message>>,
) -> Element<'a, Message>
where
    Message: 'a,
{
    container(column![text(title).size(16), content.into()].spacing(8))
        .padding(10)
        .width(Length::Fill)
        .style(|theme: &Theme| bordered_box(theme))
        .into()
}
