//! Interface to the interactive map widget used for picking the location.
//!
//! The compositor never talks to this controller; it only receives the
//! coordinate and zoom the controller last reported.

use crate::geo::GeoPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapEventKind {
    Click,
    MarkerDragEnd,
}

pub type MapEventHandler = Box<dyn FnMut(GeoPoint)>;

pub trait MapController {
    fn set_view(&mut self, center: GeoPoint, zoom: u8);
    fn set_marker(&mut self, point: GeoPoint);
    fn on(&mut self, kind: MapEventKind, handler: MapEventHandler);
}

/// Controller without a display: records view and marker state and
/// dispatches synthetic events to registered handlers.
#[derive(Default)]
pub struct HeadlessMap {
    view: Option<(GeoPoint, u8)>,
    marker: Option<GeoPoint>,
    handlers: Vec<(MapEventKind, MapEventHandler)>,
}

impl HeadlessMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> Option<(GeoPoint, u8)> {
        self.view
    }

    pub fn marker(&self) -> Option<GeoPoint> {
        self.marker
    }

    /// Deliver an event the way the widget would: the marker follows the
    /// point, then every handler for `kind` runs. Returns the handler count.
    pub fn emit(&mut self, kind: MapEventKind, point: GeoPoint) -> usize {
        self.marker = Some(point);
        let mut invoked = 0;
        for (registered, handler) in self.handlers.iter_mut() {
            if *registered == kind {
                handler(point);
                invoked += 1;
            }
        }
        invoked
    }
}

impl MapController for HeadlessMap {
    fn set_view(&mut self, center: GeoPoint, zoom: u8) {
        self.view = Some((center, zoom));
    }

    fn set_marker(&mut self, point: GeoPoint) {
        self.marker = Some(point);
    }

    fn on(&mut self, kind: MapEventKind, handler: MapEventHandler) {
        self.handlers.push((kind, handler));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn dispatches_only_matching_handlers() {
        let picked = Rc::new(RefCell::new(Vec::new()));
        let mut map = HeadlessMap::new();
        let sink = Rc::clone(&picked);
        map.on(MapEventKind::Click, Box::new(move |p| sink.borrow_mut().push(p)));

        let point = GeoPoint::new(-25.0, -49.0).unwrap();
        assert_eq!(map.emit(MapEventKind::MarkerDragEnd, point), 0);
        assert_eq!(map.emit(MapEventKind::Click, point), 1);
        assert_eq!(*picked.borrow(), vec![point]);
        assert_eq!(map.marker(), Some(point));
    }

    #[test]
    fn records_view_and_marker() {
        let mut map = HeadlessMap::new();
        let point = GeoPoint::new(-23.3, -51.16).unwrap();
        map.set_view(point, 14);
        map.set_marker(point);
        assert_eq!(map.view(), Some((point, 14)));
        assert_eq!(map.marker(), Some(point));
    }
}
