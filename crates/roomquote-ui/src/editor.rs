//! 编辑器控制器
//!
//! `Editor` 独占文档、历史与交互状态，宿主的所有输入事件都经由它分发：
//! - 指针事件驱动拖动、缩放、顶点拖动与区域绘制
//! - 键盘事件处理完成 / 取消绘制、删除与撤销
//! - 属性编辑命令在成功后立即存入历史
//!
//! 历史快照只在一个手势完整结束后保存，拖动过程中不会入栈。

use crate::state::{AnnotationHandle, Interaction, Key, Modifiers, Notice, Tool};
use roomquote_core::catalog::{CatalogEntry, CustomAddon};
use roomquote_core::collision::{resolve_drag, resolve_placement};
use roomquote_core::config::LayoutConfig;
use roomquote_core::error::{LayoutError, LayoutResult};
use roomquote_core::history::SnapshotHistory;
use roomquote_core::math::{all_finite, Point2};
use roomquote_core::model::{
    AnnotationData, Background, EntityId, LayoutDocument, LinkedComponent, ModelState, PlacedItem,
    Selection,
};
use roomquote_core::pricing::{calculate_full_quotation, Quotation};
use roomquote_core::region::{self, Candidate, DraftStep, RegionDraft};
use roomquote_core::resize::{self, ItemFrame, ResizeDirection, ResizeSession};

/// 手柄 / 顶点 / 标注端点的命中半径
pub const HANDLE_TOLERANCE: f64 = 8.0;

/// 复制物件时的位移
const DUPLICATE_OFFSET: f64 = 20.0;

pub struct Editor {
    doc: LayoutDocument,
    history: SnapshotHistory,
    config: LayoutConfig,
    selection: Selection,
    interaction: Interaction,
    tool: Tool,
    /// 新墙体使用的厚度
    wall_thickness: f64,
    notices: Vec<Notice>,
    /// 残余重叠的物件（仅作视觉提示）
    collision_warning: Option<EntityId>,
    /// 撤销 / 重做后需要整体重绘
    redraw_all: bool,
}

impl Editor {
    pub fn new(config: LayoutConfig) -> Self {
        Self::with_document(LayoutDocument::new(), config)
    }

    /// 以已有文档启动，初始状态作为第一份快照
    pub fn with_document(doc: LayoutDocument, config: LayoutConfig) -> Self {
        let mut history = SnapshotHistory::new(config.history_limit);
        history.save_state(&doc.state());
        Self {
            doc,
            history,
            wall_thickness: config.default_wall_thickness,
            config,
            selection: Selection::None,
            interaction: Interaction::Idle,
            tool: Tool::Select,
            notices: Vec::new(),
            collision_warning: None,
            redraw_all: false,
        }
    }

    pub fn document(&self) -> &LayoutDocument {
        &self.doc
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn collision_warning(&self) -> Option<EntityId> {
        self.collision_warning
    }

    /// 取出并清除整体重绘请求
    pub fn take_redraw_request(&mut self) -> bool {
        std::mem::replace(&mut self.redraw_all, false)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn quotation(&self) -> Quotation {
        calculate_full_quotation(&self.doc, &self.config)
    }

    pub fn select(&mut self, selection: Selection) {
        if self.interaction.is_idle() {
            self.selection = selection;
        }
    }

    // ========== 工具 ==========

    /// 切换工具；区域工具直接进入绘制状态
    pub fn set_tool(&mut self, tool: Tool) {
        match self.interaction {
            Interaction::Idle => {}
            Interaction::DrawingRegion(_) => self.cancel_drawing(),
            _ => self.pointer_up(),
        }

        self.tool = tool;
        tracing::debug!("Switched to {} tool", tool.name());
        if let Some(kind) = tool.region_kind() {
            self.selection = Selection::None;
            let draft = RegionDraft::new(kind, &self.config).with_thickness(self.wall_thickness);
            self.interaction = Interaction::DrawingRegion(draft);
            tracing::debug!("Started drawing {} region", kind.name());
        }
    }

    /// 设置新墙体厚度
    pub fn set_draft_thickness(&mut self, thickness: f64) -> LayoutResult<()> {
        if !thickness.is_finite() || thickness <= 0.0 {
            return self.track(Err(LayoutError::InvalidDimension(format!(
                "thickness = {thickness}"
            ))));
        }
        self.wall_thickness = thickness;
        if let Interaction::DrawingRegion(draft) = &mut self.interaction {
            draft.thickness = thickness;
        }
        Ok(())
    }

    /// 绘制中的候选顶点（预览用）
    pub fn draft_candidate(&self, pointer: Point2, modifiers: Modifiers) -> Option<Candidate> {
        match &self.interaction {
            Interaction::DrawingRegion(draft) => {
                Some(draft.candidate(pointer, modifiers.shift, &self.config))
            }
            _ => None,
        }
    }

    // ========== 指针事件 ==========

    pub fn pointer_down(&mut self, p: Point2, modifiers: Modifiers) {
        if let Interaction::DrawingRegion(draft) = &mut self.interaction {
            let step = draft.click(p, modifiers.shift, &self.config);
            match step {
                DraftStep::Added => tracing::debug!("Draft vertex ({:.1}, {:.1})", p.x, p.y),
                DraftStep::Ignored => {}
                DraftStep::Close => self.finish_drawing(),
            }
            return;
        }
        if !self.interaction.is_idle() {
            return;
        }

        self.collision_warning = None;
        if let Some(interaction) = self.grab_handle(&p) {
            self.interaction = interaction;
            return;
        }

        let hit = self.doc.hit_test(&p, HANDLE_TOLERANCE);
        self.selection = hit;
        self.interaction = match hit {
            Selection::Item(id) => match self.doc.item(id) {
                Some(item) => Interaction::Dragging {
                    item_id: id,
                    grab_offset: p - Point2::new(item.x, item.y),
                    moved: false,
                },
                None => Interaction::Idle,
            },
            Selection::Annotation(id) => match self.doc.annotation(id) {
                Some(a) => {
                    let label = Point2::new(a.x, a.y);
                    let tip = Point2::new(a.target_x, a.target_y);
                    let (handle, anchor) = if (tip - p).norm() < (label - p).norm() {
                        (AnnotationHandle::Tip, tip)
                    } else {
                        (AnnotationHandle::Label, label)
                    };
                    Interaction::DraggingAnnotation {
                        id,
                        handle,
                        grab_offset: p - anchor,
                        moved: false,
                    }
                }
                None => Interaction::Idle,
            },
            Selection::Region(_) | Selection::None => Interaction::Idle,
        };
    }

    pub fn pointer_move(&mut self, p: Point2) {
        let result = match &mut self.interaction {
            Interaction::Idle | Interaction::DrawingRegion(_) => return,
            Interaction::Dragging {
                item_id,
                grab_offset,
                moved,
            } => {
                let id = *item_id;
                let target = p - *grab_offset;
                match resolve_drag(&mut self.doc, id, target.x, target.y, &self.config) {
                    Ok(outcome) => {
                        *moved = true;
                        self.collision_warning = outcome.warning.then_some(id);
                        Ok(())
                    }
                    Err(e) => Err(e),
                }
            }
            Interaction::Resizing { session, moved } => session
                .apply(&mut self.doc, p, &self.config)
                .map(|_| *moved = true),
            Interaction::DraggingVertex {
                region_id,
                index,
                moved,
            } => region::move_vertex(&mut self.doc, *region_id, *index, p, &self.config)
                .map(|_| *moved = true),
            Interaction::DraggingAnnotation {
                id,
                handle,
                grab_offset,
                moved,
            } => {
                let target = p - *grab_offset;
                if !all_finite(&[target.x, target.y]) {
                    Err(LayoutError::NonFinite("annotation position"))
                } else if let Some(a) = self.doc.annotation_mut(*id) {
                    match handle {
                        AnnotationHandle::Label => {
                            a.x = target.x;
                            a.y = target.y;
                        }
                        AnnotationHandle::Tip => {
                            a.target_x = target.x;
                            a.target_y = target.y;
                        }
                    }
                    *moved = true;
                    Ok(())
                } else {
                    Err(LayoutError::EntityNotFound(*id))
                }
            }
        };

        if let Err(e) = result {
            if e.is_validation() {
                // 会破坏多边形的顶点位置直接忽略
                tracing::debug!("Skipped move: {}", e);
            } else {
                self.report(&e);
            }
        }
    }

    /// 结束当前手势；有修改时存入历史
    pub fn pointer_up(&mut self) {
        match std::mem::take(&mut self.interaction) {
            Interaction::DrawingRegion(draft) => {
                self.interaction = Interaction::DrawingRegion(draft);
            }
            finished => {
                if finished.has_moved() {
                    self.commit(finished.name());
                }
            }
        }
    }

    /// 命中当前选中对象的缩放手柄或区域顶点
    fn grab_handle(&self, p: &Point2) -> Option<Interaction> {
        match self.selection {
            Selection::Item(id) => {
                let rect = self.doc.item(id)?.rect();
                let direction = ResizeDirection::ALL
                    .into_iter()
                    .find(|dir| (dir.handle_position(&rect) - p).norm() <= HANDLE_TOLERANCE)?;
                let session = ResizeSession::start(&self.doc, id, direction, *p).ok()?;
                Some(Interaction::Resizing {
                    session,
                    moved: false,
                })
            }
            Selection::Region(id) => {
                let index = self
                    .doc
                    .region(id)?
                    .points
                    .iter()
                    .position(|v| (v - p).norm() <= HANDLE_TOLERANCE)?;
                Some(Interaction::DraggingVertex {
                    region_id: id,
                    index,
                    moved: false,
                })
            }
            Selection::Annotation(_) | Selection::None => None,
        }
    }

    // ========== 区域绘制 ==========

    fn finish_drawing(&mut self) {
        let Interaction::DrawingRegion(draft) = &self.interaction else {
            return;
        };
        // 失败时保留草稿，用户可以继续补点
        match draft.clone().finalize(&self.config) {
            Ok(region) => {
                let kind = region.kind;
                let id = self.doc.add_region(region);
                self.interaction = Interaction::Idle;
                self.tool = Tool::Select;
                self.selection = Selection::Region(id);
                tracing::info!("Finalized {} region {}", kind.name(), id);
                let summary = match self.doc.region(id).and_then(|r| r.area_in_ping) {
                    Some(ping) => format!("Added {} region ({} 坪)", kind.name(), ping),
                    None => format!("Added {} region", kind.name()),
                };
                self.notices.push(Notice::info(summary));
                self.commit("finalize region");
            }
            Err(e) => self.report(&e),
        }
    }

    fn cancel_drawing(&mut self) {
        if let Interaction::DrawingRegion(draft) = &self.interaction {
            tracing::info!(
                "Cancelled {} drawing with {} points",
                draft.kind.name(),
                draft.points.len()
            );
            self.interaction = Interaction::Idle;
            self.tool = Tool::Select;
        }
    }

    // ========== 键盘 ==========

    pub fn key(&mut self, key: Key) {
        let drawing = matches!(self.interaction, Interaction::DrawingRegion(_));
        match key {
            Key::Enter if drawing => self.finish_drawing(),
            Key::Escape if drawing => self.cancel_drawing(),
            Key::Escape => {
                if self.interaction.is_idle() {
                    self.selection = Selection::None;
                }
            }
            Key::Backspace if drawing => {
                if let Interaction::DrawingRegion(draft) = &mut self.interaction {
                    draft.undo_last();
                }
            }
            Key::Backspace | Key::Delete => {
                self.delete_selected();
            }
            Key::Undo => {
                self.undo();
            }
            Key::Redo => {
                self.redo();
            }
            Key::Enter => {}
        }
    }

    // ========== 撤销 / 重做 ==========

    pub fn undo(&mut self) -> bool {
        if !self.interaction.is_idle() {
            return false;
        }
        match self.history.undo() {
            Some(state) => {
                self.load_snapshot(state);
                tracing::info!("Undo");
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        if !self.interaction.is_idle() {
            return false;
        }
        match self.history.redo() {
            Some(state) => {
                self.load_snapshot(state);
                tracing::info!("Redo");
                true
            }
            None => false,
        }
    }

    fn load_snapshot(&mut self, state: ModelState) {
        self.doc.restore(state);
        let alive = match self.selection {
            Selection::None => false,
            Selection::Item(id) => self.doc.item(id).is_some(),
            Selection::Region(id) => self.doc.region(id).is_some(),
            Selection::Annotation(id) => self.doc.annotation(id).is_some(),
        };
        if !alive {
            self.selection = Selection::None;
        }
        self.collision_warning = None;
        self.redraw_all = true;
    }

    // ========== 文档命令 ==========

    /// 放置目录条目，落点重叠时推离一次
    pub fn add_item(&mut self, entry: CatalogEntry, x: f64, y: f64) -> LayoutResult<EntityId> {
        if !all_finite(&[x, y]) {
            return self.track(Err(LayoutError::NonFinite("drop position")));
        }
        let id = self.doc.allocate_id();
        let mut item = PlacedItem::new(id, entry, x, y, self.config.min_item_size);
        // 落点确定后才写入文档，失败时文档保持不变
        let outcome = resolve_placement(&self.doc, &item, &self.config);
        let outcome = self.track(outcome)?;
        item.x = outcome.x;
        item.y = outcome.y;
        self.doc.items.push(item);
        self.collision_warning = outcome.warning.then_some(id);
        self.selection = Selection::Item(id);
        tracing::info!("Placed item {} at ({:.1}, {:.1})", id, outcome.x, outcome.y);
        self.commit("add item");
        Ok(id)
    }

    pub fn add_annotation(
        &mut self,
        data: AnnotationData,
        label: Point2,
        target: Point2,
    ) -> LayoutResult<EntityId> {
        if !all_finite(&[label.x, label.y, target.x, target.y]) {
            return self.track(Err(LayoutError::NonFinite("annotation position")));
        }
        let id = self.doc.add_annotation(data, label, target);
        self.selection = Selection::Annotation(id);
        self.commit("add annotation");
        Ok(id)
    }

    pub fn delete_selected(&mut self) -> bool {
        if !self.interaction.is_idle() {
            return false;
        }
        let removed = self.doc.remove(self.selection);
        if removed {
            tracing::info!("Deleted {:?}", self.selection);
            self.selection = Selection::None;
            self.collision_warning = None;
            self.commit("delete");
        }
        removed
    }

    pub fn duplicate_selected(&mut self) -> LayoutResult<EntityId> {
        let id = self.selected_item()?;
        let copy = self
            .doc
            .duplicate_item(id, DUPLICATE_OFFSET, DUPLICATE_OFFSET)
            .ok_or(LayoutError::EntityNotFound(id));
        let copy = self.track(copy)?;
        self.selection = Selection::Item(copy);
        self.commit("duplicate");
        Ok(copy)
    }

    /// 数值输入尺寸
    pub fn set_dimensions(&mut self, width: f64, height: f64) -> LayoutResult<ItemFrame> {
        self.edit_item("set dimensions", |doc, id, config| {
            resize::set_dimensions(doc, id, width, height, config)
        })
    }

    pub fn rotate_selected(&mut self, step_deg: f64) -> LayoutResult<f64> {
        self.edit_item("rotate", |doc, id, _| resize::rotate_by(doc, id, step_deg))
    }

    pub fn set_rotation(&mut self, angle_deg: f64) -> LayoutResult<f64> {
        self.edit_item("rotate", |doc, id, _| resize::set_rotation(doc, id, angle_deg))
    }

    pub fn toggle_mirror(&mut self) -> LayoutResult<bool> {
        self.edit_item("mirror", |doc, id, _| resize::toggle_mirror(doc, id))
    }

    pub fn set_opacity(&mut self, opacity: f64) -> LayoutResult<f64> {
        self.edit_item("opacity", |doc, id, _| resize::set_opacity(doc, id, opacity))
    }

    /// 才数（`cai` 计价）
    pub fn set_cai_qty(&mut self, qty: f64) -> LayoutResult<()> {
        self.edit_item("cai quantity", |doc, id, _| {
            check_quantity(qty)?;
            let item = doc.item_mut(id).ok_or(LayoutError::EntityNotFound(id))?;
            item.cai_qty = qty;
            Ok(())
        })
    }

    /// 目录加购项数量（物件或区域）
    pub fn set_addon_qty(&mut self, index: usize, qty: f64) -> LayoutResult<()> {
        let result = check_quantity(qty).and_then(|_| match self.selection {
            Selection::Item(id) => {
                let item = self
                    .doc
                    .item_mut(id)
                    .ok_or(LayoutError::EntityNotFound(id))?;
                item.set_addon_qty(index, qty);
                Ok(())
            }
            Selection::Region(id) => {
                let region = self
                    .doc
                    .region_mut(id)
                    .ok_or(LayoutError::EntityNotFound(id))?;
                if region.addons.len() <= index {
                    region.addons.resize(index + 1, 0.0);
                }
                region.addons[index] = qty;
                Ok(())
            }
            Selection::Annotation(_) | Selection::None => Err(LayoutError::InvalidState(
                "addon quantities need a selected item or region".to_string(),
            )),
        });
        self.track(result)?;
        self.commit("addon quantity");
        Ok(())
    }

    pub fn add_custom_addon(&mut self, addon: CustomAddon) -> LayoutResult<usize> {
        let result = check_addon(&addon).and_then(|_| {
            let addons = self.selected_custom_addons()?;
            addons.push(addon);
            Ok(addons.len() - 1)
        });
        let index = self.track(result)?;
        self.commit("add custom addon");
        Ok(index)
    }

    pub fn update_custom_addon(&mut self, index: usize, addon: CustomAddon) -> LayoutResult<()> {
        let result = check_addon(&addon).and_then(|_| {
            let addons = self.selected_custom_addons()?;
            let slot = addons.get_mut(index).ok_or_else(|| {
                LayoutError::InvalidState(format!("custom addon {index} does not exist"))
            })?;
            *slot = addon;
            Ok(())
        });
        self.track(result)?;
        self.commit("edit custom addon");
        Ok(())
    }

    pub fn remove_custom_addon(&mut self, index: usize) -> LayoutResult<CustomAddon> {
        let result = self.selected_custom_addons().and_then(|addons| {
            if index < addons.len() {
                Ok(addons.remove(index))
            } else {
                Err(LayoutError::InvalidState(format!(
                    "custom addon {index} does not exist"
                )))
            }
        });
        let removed = self.track(result)?;
        self.commit("remove custom addon");
        Ok(removed)
    }

    pub fn set_note(&mut self, note: impl Into<String>) -> LayoutResult<()> {
        let note = note.into();
        let result = match self.selection {
            Selection::Item(id) => self.doc.item_mut(id).map(|i| i.note = note),
            Selection::Region(id) => self.doc.region_mut(id).map(|r| r.note = note),
            Selection::Annotation(id) => self.doc.annotation_mut(id).map(|a| a.note = note),
            Selection::None => None,
        }
        .ok_or_else(|| LayoutError::InvalidState("nothing selected".to_string()));
        self.track(result)?;
        self.commit("note");
        Ok(())
    }

    /// 修改选中墙体的厚度
    pub fn set_wall_thickness(&mut self, thickness: f64) -> LayoutResult<()> {
        let result = self
            .selected_region()
            .and_then(|id| region::set_wall_thickness(&mut self.doc, id, thickness, &self.config));
        self.track(result)?;
        self.commit("wall thickness");
        Ok(())
    }

    /// 为选中区域关联（或取消关联）计价项目
    pub fn link_component(&mut self, component: Option<LinkedComponent>) -> LayoutResult<()> {
        let result = self.selected_region().and_then(|id| {
            let region = self
                .doc
                .region_mut(id)
                .ok_or(LayoutError::EntityNotFound(id))?;
            let addon_count = component.as_ref().map_or(0, |c| c.addons_config.len());
            region.addons = vec![0.0; addon_count];
            region.linked_component = component;
            Ok(())
        });
        self.track(result)?;
        self.commit("link component");
        Ok(())
    }

    pub fn set_background(&mut self, background: Background) -> LayoutResult<()> {
        let values = [background.position.x, background.position.y, background.scale];
        if !all_finite(&values) || background.scale <= 0.0 {
            return self.track(Err(LayoutError::InvalidDimension(format!(
                "background scale = {}",
                background.scale
            ))));
        }
        self.doc.background = background;
        self.commit("background");
        Ok(())
    }

    /// 施工面积不参与撤销
    pub fn set_construction_area(&mut self, area: f64) -> LayoutResult<()> {
        self.track(check_quantity(area))?;
        self.doc.construction_area = area;
        Ok(())
    }

    // ========== 内部 ==========

    fn commit(&mut self, label: &str) {
        if self.history.save_state(&self.doc.state()) {
            tracing::debug!("Committed '{}'", label);
        }
    }

    /// 记录错误：校验错误转为用户提示
    fn report(&mut self, error: &LayoutError) {
        if error.is_validation() {
            tracing::warn!("Rejected input: {}", error);
            self.notices.push(Notice::warning(error.to_string()));
        } else {
            tracing::warn!("Command failed: {}", error);
        }
    }

    fn track<T>(&mut self, result: LayoutResult<T>) -> LayoutResult<T> {
        if let Err(e) = &result {
            self.report(e);
        }
        result
    }

    fn selected_item(&self) -> LayoutResult<EntityId> {
        match self.selection {
            Selection::Item(id) => Ok(id),
            _ => Err(LayoutError::InvalidState("no item selected".to_string())),
        }
    }

    fn selected_region(&self) -> LayoutResult<EntityId> {
        match self.selection {
            Selection::Region(id) => Ok(id),
            _ => Err(LayoutError::InvalidState("no region selected".to_string())),
        }
    }

    fn selected_custom_addons(&mut self) -> LayoutResult<&mut Vec<CustomAddon>> {
        let addons = match self.selection {
            Selection::Item(id) => self.doc.item_mut(id).map(|i| &mut i.custom_addons),
            Selection::Region(id) => self.doc.region_mut(id).map(|r| &mut r.custom_addons),
            Selection::Annotation(id) => self.doc.annotation_mut(id).map(|a| &mut a.custom_addons),
            Selection::None => None,
        };
        addons.ok_or_else(|| LayoutError::InvalidState("nothing selected".to_string()))
    }

    /// 对选中物件执行一次编辑，成功后存入历史
    fn edit_item<T>(
        &mut self,
        label: &str,
        edit: impl FnOnce(&mut LayoutDocument, EntityId, &LayoutConfig) -> LayoutResult<T>,
    ) -> LayoutResult<T> {
        if !self.interaction.is_idle() {
            return Err(LayoutError::InvalidState(format!(
                "cannot {label} during {}",
                self.interaction.name()
            )));
        }
        let result = self
            .selected_item()
            .and_then(|id| edit(&mut self.doc, id, &self.config));
        let value = self.track(result)?;
        self.commit(label);
        Ok(value)
    }
}

fn check_quantity(qty: f64) -> LayoutResult<()> {
    if qty.is_finite() && qty >= 0.0 {
        Ok(())
    } else {
        Err(LayoutError::InvalidDimension(format!("quantity = {qty}")))
    }
}

fn check_addon(addon: &CustomAddon) -> LayoutResult<()> {
    if addon.name.trim().is_empty() {
        return Err(LayoutError::InvalidDimension("addon name is empty".to_string()));
    }
    if !addon.price.is_finite() {
        return Err(LayoutError::InvalidDimension(format!("price = {}", addon.price)));
    }
    check_quantity(addon.qty)
}
